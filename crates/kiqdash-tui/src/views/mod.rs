// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod overview;
mod queues;
mod sorted;
mod workers;

pub use overview::OverviewView;
pub use queues::QueuesView;
pub use sorted::SortedSetView;
pub use workers::WorkersView;

use crate::app::{FetchData, FetchRequest};
use crate::frame::{Bordered, Frame};
use crate::theme::Styles;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use kiqdash_app::{PaneKind, SortedSet};
use ratatui::text::{Line, Span};

const LOADING_MESSAGE: &str = "Loading...";
const META_SEPARATOR: &str = " • ";

/// Where a pane is in its fetch cycle. Once a pane has been `Ready` it
/// keeps its rows through later `Loading` phases and failed fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Loader {
    state: LoadState,
    loaded: bool,
}

impl Loader {
    fn start(&mut self) {
        self.state = LoadState::Loading;
    }

    fn succeed(&mut self) {
        self.state = LoadState::Ready;
        self.loaded = true;
    }

    fn fail(&mut self) {
        self.state = LoadState::Ready;
    }

    /// Nothing to show yet: no result, successful or not, has arrived.
    fn waiting(&self) -> bool {
        !self.loaded && self.state != LoadState::Ready
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageStep {
    Previous,
    Next,
}

fn page_step_for_key(key: KeyEvent) -> Option<PageStep> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('['), _) => Some(PageStep::Previous),
        (KeyCode::Char(']'), _) => Some(PageStep::Next),
        (KeyCode::Left, modifiers) if modifiers.contains(KeyModifiers::ALT) => {
            Some(PageStep::Previous)
        }
        (KeyCode::Right, modifiers) if modifiers.contains(KeyModifiers::ALT) => {
            Some(PageStep::Next)
        }
        _ => None,
    }
}

pub fn pane_for_set(set: SortedSet) -> PaneKind {
    match set {
        SortedSet::Retry => PaneKind::Retries,
        SortedSet::Schedule => PaneKind::Scheduled,
        SortedSet::Dead => PaneKind::Dead,
    }
}

fn message_box(title: &str, message: &str, styles: &Styles, width: u16, height: u16) -> Frame {
    Bordered::new(title)
        .content(vec![Line::from(Span::styled(message.to_owned(), styles.muted))])
        .padding(1)
        .style(styles.frame())
        .render(width, height)
}

/// `LABEL: value • LABEL: value` for a frame's top border.
fn meta_line(styles: &Styles, items: &[(&str, String)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (index, (label, value)) in items.iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(META_SEPARATOR, styles.muted));
        }
        spans.push(Span::styled(format!("{label}: "), styles.metric_label));
        spans.push(Span::styled(value.clone(), styles.metric_value));
    }
    Line::from(spans)
}

// Table area inside a padded frame.
fn table_size(width: u16, height: u16) -> (u16, u16) {
    (width.saturating_sub(4), height.saturating_sub(2).max(3))
}

/// One dashboard pane. The controller only talks to panes through this
/// enum so every capability is matched exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Pane {
    Overview(OverviewView),
    Workers(WorkersView),
    Queues(QueuesView),
    Sorted(SortedSetView),
}

impl Pane {
    pub fn for_kind(kind: PaneKind, styles: Styles) -> Self {
        match kind {
            PaneKind::Overview => Self::Overview(OverviewView::new(styles)),
            PaneKind::Workers => Self::Workers(WorkersView::new(styles)),
            PaneKind::Queues => Self::Queues(QueuesView::new(styles)),
            PaneKind::Retries => Self::Sorted(SortedSetView::new(SortedSet::Retry, styles)),
            PaneKind::Scheduled => Self::Sorted(SortedSetView::new(SortedSet::Schedule, styles)),
            PaneKind::Dead => Self::Sorted(SortedSetView::new(SortedSet::Dead, styles)),
        }
    }

    pub fn kind(&self) -> PaneKind {
        match self {
            Self::Overview(_) => PaneKind::Overview,
            Self::Workers(_) => PaneKind::Workers,
            Self::Queues(_) => PaneKind::Queues,
            Self::Sorted(view) => pane_for_set(view.set()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().label()
    }

    pub fn load_state(&self) -> LoadState {
        match self {
            Self::Overview(view) => view.load_state(),
            Self::Workers(view) => view.load_state(),
            Self::Queues(view) => view.load_state(),
            Self::Sorted(view) => view.load_state(),
        }
    }

    /// Cold start on activation: back to the first page and a fresh fetch.
    pub fn init(&mut self) -> FetchRequest {
        match self {
            Self::Overview(view) => view.init(),
            Self::Workers(view) => view.init(),
            Self::Queues(view) => view.init(),
            Self::Sorted(view) => view.init(),
        }
    }

    /// Re-fetches what the pane currently shows.
    pub fn refresh(&mut self) -> FetchRequest {
        match self {
            Self::Overview(view) => view.refresh(),
            Self::Workers(view) => view.refresh(),
            Self::Queues(view) => view.refresh(),
            Self::Sorted(view) => view.refresh(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<FetchRequest> {
        match self {
            Self::Overview(_) => None,
            Self::Workers(view) => view.handle_key(key),
            Self::Queues(view) => view.handle_key(key),
            Self::Sorted(view) => view.handle_key(key),
        }
    }

    /// Applies a successful result. Data of the wrong shape is ignored.
    pub fn apply(&mut self, request: FetchRequest, data: FetchData, now: i64) {
        match (self, data) {
            (Self::Overview(view), FetchData::Overview(overview)) => view.apply(overview, now),
            (Self::Workers(view), FetchData::Workers(snapshot)) => view.apply(snapshot, now),
            (Self::Queues(view), FetchData::Queues(queues)) => view.apply(queues),
            (Self::Sorted(view), FetchData::Page(page)) => {
                if let FetchRequest::Page { page: requested, .. } = request {
                    view.apply(requested, page, now);
                }
            }
            _ => {}
        }
    }

    pub fn fail(&mut self) {
        match self {
            Self::Overview(view) => view.fail(),
            Self::Workers(view) => view.fail(),
            Self::Queues(view) => view.fail(),
            Self::Sorted(view) => view.fail(),
        }
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        match self {
            Self::Overview(view) => view.set_size(width, height),
            Self::Workers(view) => view.set_size(width, height),
            Self::Queues(view) => view.set_size(width, height),
            Self::Sorted(view) => view.set_size(width, height),
        }
    }

    pub fn set_styles(&mut self, styles: Styles) {
        match self {
            Self::Overview(view) => view.set_styles(styles),
            Self::Workers(view) => view.set_styles(styles),
            Self::Queues(view) => view.set_styles(styles),
            Self::Sorted(view) => view.set_styles(styles),
        }
    }

    pub fn view(&self) -> Frame {
        match self {
            Self::Overview(view) => view.view(),
            Self::Workers(view) => view.view(),
            Self::Queues(view) => view.view(),
            Self::Sorted(view) => view.view(),
        }
    }
}
