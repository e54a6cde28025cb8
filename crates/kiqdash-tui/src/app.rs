// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::error_popup::ErrorPopup;
use crate::frame::Frame;
use crate::metrics::MetricsStrip;
use crate::navbar::Navbar;
use crate::theme::Styles;
use crate::views::{Pane, pane_for_set};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use kiqdash_app::{
    AppCommand, AppEvent, AppState, JobPage, Overview, PaneKind, QueueSummary, SortedSet, Stats,
    ThemeMode, WorkerSnapshot,
};
use ratatui::text::Line;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRequest {
    Stats,
    Overview,
    Workers,
    Queues,
    Page {
        set: SortedSet,
        page: usize,
        offset: usize,
        limit: usize,
    },
}

impl FetchRequest {
    /// The pane a result belongs to; stats feed the metrics strip instead.
    pub fn pane(self) -> Option<PaneKind> {
        match self {
            Self::Stats => None,
            Self::Overview => Some(PaneKind::Overview),
            Self::Workers => Some(PaneKind::Workers),
            Self::Queues => Some(PaneKind::Queues),
            Self::Page { set, .. } => Some(pane_for_set(set)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::Overview => "overview",
            Self::Workers => "workers",
            Self::Queues => "queues",
            Self::Page { set, .. } => set.key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchData {
    Stats(Stats),
    Overview(Overview),
    Workers(WorkerSnapshot),
    Queues(Vec<QueueSummary>),
    Page(JobPage),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Key(KeyEvent),
    Resize {
        width: u16,
        height: u16,
    },
    Tick,
    /// A finished fetch. `at` is the Unix time it completed, used for
    /// relative times in rows.
    Fetched {
        request: FetchRequest,
        result: Result<FetchData, String>,
        at: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Fetch(FetchRequest),
    ScheduleTick(Duration),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppOptions {
    pub theme: ThemeMode,
    pub refresh_interval: Duration,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            theme: ThemeMode::Dark,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// The dashboard controller. `update` folds one message into the state and
/// returns the side effects for the event loop to run; `view` renders the
/// whole screen.
#[derive(Debug, Clone, PartialEq)]
pub struct App {
    state: AppState,
    panes: Vec<Pane>,
    metrics: MetricsStrip,
    navbar: Navbar,
    popup: ErrorPopup,
    styles: Styles,
    refresh_interval: Duration,
}

impl App {
    pub fn new(options: AppOptions) -> Self {
        let styles = Styles::for_mode(options.theme);
        let state = AppState {
            theme: options.theme,
            ..AppState::default()
        };
        Self {
            state,
            panes: PaneKind::ALL
                .into_iter()
                .map(|kind| Pane::for_kind(kind, styles))
                .collect(),
            metrics: MetricsStrip::new(styles),
            navbar: Navbar::new(styles),
            popup: ErrorPopup::new(styles),
            styles,
            refresh_interval: options.refresh_interval,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn pane(&self, kind: PaneKind) -> &Pane {
        &self.panes[kind.index()]
    }

    pub fn metrics(&self) -> &MetricsStrip {
        &self.metrics
    }

    pub fn styles(&self) -> &Styles {
        &self.styles
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    fn active_pane_mut(&mut self) -> &mut Pane {
        &mut self.panes[self.state.active_pane.index()]
    }

    /// Starts the active pane, primes the metrics strip and schedules the
    /// first refresh.
    pub fn init(&mut self) -> Vec<Command> {
        let request = self.active_pane_mut().init();
        vec![
            Command::Fetch(request),
            Command::Fetch(FetchRequest::Stats),
            Command::ScheduleTick(self.refresh_interval),
        ]
    }

    pub fn update(&mut self, message: Message) -> Vec<Command> {
        match message {
            Message::Key(key) => self.handle_key(key),
            Message::Resize { width, height } => {
                let events = self.state.dispatch(AppCommand::Resize { width, height });
                self.apply_events(events)
            }
            Message::Tick => {
                // Only the active pane polls.
                let request = self.active_pane_mut().refresh();
                vec![
                    Command::Fetch(FetchRequest::Stats),
                    Command::Fetch(request),
                    Command::ScheduleTick(self.refresh_interval),
                ]
            }
            Message::Fetched {
                request,
                result,
                at,
            } => self.handle_fetched(request, result, at),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        let command = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
                return vec![Command::Quit];
            }
            (KeyCode::Char('q'), _) => return vec![Command::Quit],
            (KeyCode::Char('t'), _) => Some(AppCommand::ToggleTheme),
            (KeyCode::Char(ch), _) => PaneKind::from_hotkey(ch).map(AppCommand::SelectPane),
            _ => None,
        };

        match command {
            Some(command) => {
                let events = self.state.dispatch(command);
                self.apply_events(events)
            }
            None => self
                .active_pane_mut()
                .handle_key(key)
                .map(Command::Fetch)
                .into_iter()
                .collect(),
        }
    }

    fn handle_fetched(
        &mut self,
        request: FetchRequest,
        result: Result<FetchData, String>,
        at: i64,
    ) -> Vec<Command> {
        let events = match result {
            Ok(data) => {
                match (request.pane(), data) {
                    (None, FetchData::Stats(stats)) => self.metrics.set_data(stats),
                    (Some(kind), data) => self.panes[kind.index()].apply(request, data, at),
                    (None, _) => {}
                }
                self.state.dispatch(AppCommand::FetchSucceeded)
            }
            Err(message) => {
                if let Some(kind) = request.pane() {
                    self.panes[kind.index()].fail();
                }
                self.state.dispatch(AppCommand::FetchFailed(message))
            }
        };
        self.apply_events(events)
    }

    fn apply_events(&mut self, events: Vec<AppEvent>) -> Vec<Command> {
        let mut commands = Vec::new();
        for event in events {
            match event {
                AppEvent::PaneActivated(kind) => {
                    // Every switch is a cold start, never a cache hit.
                    let request = self.panes[kind.index()].init();
                    commands.push(Command::Fetch(request));
                }
                AppEvent::ThemeChanged(mode) => self.apply_theme(mode),
                AppEvent::Resized { width, height } => self.resize(width, height),
                AppEvent::ConnectionLost(message) => {
                    warn!(error = %message, "connection error shown");
                }
                AppEvent::ConnectionRestored => info!("connection restored"),
            }
        }
        commands
    }

    fn apply_theme(&mut self, mode: ThemeMode) {
        self.styles = Styles::for_mode(mode);
        self.metrics.set_styles(self.styles);
        self.navbar.set_styles(self.styles);
        self.popup.set_styles(self.styles);
        for pane in &mut self.panes {
            pane.set_styles(self.styles);
        }
    }

    // The area between the metrics strip and the navigation strip.
    fn content_size(&self) -> (u16, u16) {
        let chrome = self.metrics.height() + self.navbar.height();
        (self.state.width, self.state.height.saturating_sub(chrome))
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.metrics.set_width(width);
        self.navbar.set_width(width);
        let content_height = height.saturating_sub(self.metrics.height() + self.navbar.height());
        // Hidden panes too, so switching never shows a stale size.
        for pane in &mut self.panes {
            pane.set_size(width, content_height);
        }
        self.popup.set_size(width, content_height);
    }

    pub fn view(&self) -> Frame {
        if !self.state.sized {
            return Frame::new(vec![Line::raw("Initializing...")], 15, 1);
        }
        let (content_width, content_height) = self.content_size();
        let mut content = self.pane(self.state.active_pane).view();
        if content.width() != content_width || content.height() != content_height {
            content = Frame::new(content.lines().to_vec(), content_width, content_height);
        }
        if let Some(message) = &self.state.connection_error {
            content = self.popup.render(&content, message);
        }
        let screen = Frame::stack([
            self.metrics.view(),
            content,
            self.navbar.view(self.state.active_pane),
        ]);
        Frame::new(screen.lines().to_vec(), self.state.width, self.state.height)
    }
}
