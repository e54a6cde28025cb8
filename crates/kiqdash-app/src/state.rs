// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneKind {
    Overview,
    Workers,
    Queues,
    Retries,
    Scheduled,
    Dead,
}

impl PaneKind {
    pub const ALL: [Self; 6] = [
        Self::Overview,
        Self::Workers,
        Self::Queues,
        Self::Retries,
        Self::Scheduled,
        Self::Dead,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Overview => "Dashboard",
            Self::Workers => "Busy",
            Self::Queues => "Queues",
            Self::Retries => "Retries",
            Self::Scheduled => "Scheduled",
            Self::Dead => "Dead",
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Overview => 0,
            Self::Workers => 1,
            Self::Queues => 2,
            Self::Retries => 3,
            Self::Scheduled => 4,
            Self::Dead => 5,
        }
    }

    /// Key that selects this pane, `'1'` through `'6'`.
    pub const fn hotkey(self) -> char {
        match self {
            Self::Overview => '1',
            Self::Workers => '2',
            Self::Queues => '3',
            Self::Retries => '4',
            Self::Scheduled => '5',
            Self::Dead => '6',
        }
    }

    pub fn from_hotkey(key: char) -> Option<Self> {
        Self::ALL.into_iter().find(|pane| pane.hotkey() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

impl ThemeMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub active_pane: PaneKind,
    pub theme: ThemeMode,
    pub width: u16,
    pub height: u16,
    pub sized: bool,
    pub connection_error: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            active_pane: PaneKind::Overview,
            theme: ThemeMode::Dark,
            width: 0,
            height: 0,
            sized: false,
            connection_error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    SelectPane(PaneKind),
    ToggleTheme,
    Resize { width: u16, height: u16 },
    FetchFailed(String),
    FetchSucceeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    PaneActivated(PaneKind),
    ThemeChanged(ThemeMode),
    Resized { width: u16, height: u16 },
    ConnectionLost(String),
    ConnectionRestored,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SelectPane(pane) => {
                if pane == self.active_pane {
                    return Vec::new();
                }
                self.active_pane = pane;
                vec![AppEvent::PaneActivated(pane)]
            }
            AppCommand::ToggleTheme => {
                self.theme = self.theme.toggled();
                vec![AppEvent::ThemeChanged(self.theme)]
            }
            AppCommand::Resize { width, height } => {
                self.width = width;
                self.height = height;
                self.sized = true;
                vec![AppEvent::Resized { width, height }]
            }
            AppCommand::FetchFailed(message) => {
                self.connection_error = Some(message.clone());
                vec![AppEvent::ConnectionLost(message)]
            }
            AppCommand::FetchSucceeded => match self.connection_error.take() {
                Some(_) => vec![AppEvent::ConnectionRestored],
                None => Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState, PaneKind, ThemeMode};

    #[test]
    fn selecting_the_active_pane_is_a_no_op() {
        let mut state = AppState::default();
        assert!(state.dispatch(AppCommand::SelectPane(PaneKind::Overview)).is_empty());

        let events = state.dispatch(AppCommand::SelectPane(PaneKind::Dead));
        assert_eq!(state.active_pane, PaneKind::Dead);
        assert_eq!(events, vec![AppEvent::PaneActivated(PaneKind::Dead)]);
    }

    #[test]
    fn theme_toggle_flips_mode() {
        let mut state = AppState::default();
        let events = state.dispatch(AppCommand::ToggleTheme);
        assert_eq!(state.theme, ThemeMode::Light);
        assert_eq!(events, vec![AppEvent::ThemeChanged(ThemeMode::Light)]);

        state.dispatch(AppCommand::ToggleTheme);
        assert_eq!(state.theme, ThemeMode::Dark);
    }

    #[test]
    fn connection_error_keeps_only_latest_failure() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::FetchFailed("first".to_owned()));
        state.dispatch(AppCommand::FetchFailed("second".to_owned()));
        assert_eq!(state.connection_error.as_deref(), Some("second"));

        let events = state.dispatch(AppCommand::FetchSucceeded);
        assert_eq!(events, vec![AppEvent::ConnectionRestored]);
        assert_eq!(state.connection_error, None);

        assert!(state.dispatch(AppCommand::FetchSucceeded).is_empty());
    }

    #[test]
    fn resize_marks_state_sized() {
        let mut state = AppState::default();
        assert!(!state.sized);
        state.dispatch(AppCommand::Resize {
            width: 120,
            height: 40,
        });
        assert!(state.sized);
        assert_eq!((state.width, state.height), (120, 40));
    }

    #[test]
    fn hotkeys_map_back_to_panes() {
        for pane in PaneKind::ALL {
            assert_eq!(PaneKind::from_hotkey(pane.hotkey()), Some(pane));
            assert_eq!(PaneKind::ALL[pane.index()], pane);
        }
        assert_eq!(PaneKind::from_hotkey('7'), None);
    }
}
