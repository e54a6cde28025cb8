// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use super::{
    LOADING_MESSAGE, LoadState, Loader, PageStep, message_box, meta_line, page_step_for_key,
    pane_for_set, table_size,
};
use crate::app::FetchRequest;
use crate::frame::{Bordered, Frame};
use crate::table::{Column, Table};
use crate::theme::Styles;
use crossterm::event::KeyEvent;
use kiqdash_app::{JobPage, Pager, SortedEntry, SortedSet, format};

const RETRY_COLUMNS: [Column; 6] = [
    Column::new("Next Retry", 12),
    Column::new("Retries", 7),
    Column::new("Queue", 15),
    Column::new("Job", 30),
    Column::new("Arguments", 40),
    Column::new("Error", 60),
];

const SCHEDULED_COLUMNS: [Column; 4] = [
    Column::new("When", 12),
    Column::new("Queue", 15),
    Column::new("Job", 30),
    Column::new("Arguments", 60),
];

const DEAD_COLUMNS: [Column; 5] = [
    Column::new("Last Retry", 12),
    Column::new("Queue", 15),
    Column::new("Job", 30),
    Column::new("Arguments", 40),
    Column::new("Error", 60),
];

fn columns_for(set: SortedSet) -> Vec<Column> {
    match set {
        SortedSet::Retry => RETRY_COLUMNS.to_vec(),
        SortedSet::Schedule => SCHEDULED_COLUMNS.to_vec(),
        SortedSet::Dead => DEAD_COLUMNS.to_vec(),
    }
}

fn empty_message_for(set: SortedSet) -> &'static str {
    match set {
        SortedSet::Retry => "No retries",
        SortedSet::Schedule => "No scheduled jobs",
        SortedSet::Dead => "No dead jobs",
    }
}

fn row_for(set: SortedSet, entry: &SortedEntry, now: i64) -> Vec<String> {
    let job = &entry.job;
    let args = format::args(job.display_args());
    let error = format::error_summary(job.error_class(), job.error_message());
    match set {
        SortedSet::Retry => vec![
            format::duration(entry.at() - now),
            job.retry_count.to_string(),
            job.queue.clone(),
            job.display_class().to_owned(),
            args,
            error,
        ],
        SortedSet::Schedule => vec![
            format::duration(entry.at() - now),
            job.queue.clone(),
            job.display_class().to_owned(),
            args,
        ],
        SortedSet::Dead => vec![
            format::duration(now - entry.at()),
            job.queue.clone(),
            job.display_class().to_owned(),
            args,
            error,
        ],
    }
}

/// A page-at-a-time view over one of the retry, schedule and dead sets.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSetView {
    set: SortedSet,
    pager: Pager,
    entries: Vec<SortedEntry>,
    table: Table,
    loader: Loader,
    width: u16,
    height: u16,
    styles: Styles,
}

impl SortedSetView {
    pub fn new(set: SortedSet, styles: Styles) -> Self {
        Self {
            set,
            pager: Pager::default(),
            entries: Vec::new(),
            table: Table::new(columns_for(set), empty_message_for(set)),
            loader: Loader::default(),
            width: 0,
            height: 0,
            styles,
        }
    }

    pub fn set(&self) -> SortedSet {
        self.set
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn entries(&self) -> &[SortedEntry] {
        &self.entries
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn load_state(&self) -> LoadState {
        self.loader.state
    }

    fn request(&mut self) -> FetchRequest {
        self.loader.start();
        FetchRequest::Page {
            set: self.set,
            page: self.pager.current_page(),
            offset: self.pager.offset(),
            limit: self.pager.page_size(),
        }
    }

    pub fn init(&mut self) -> FetchRequest {
        self.pager.reset();
        self.request()
    }

    pub fn refresh(&mut self) -> FetchRequest {
        self.request()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<FetchRequest> {
        let moved = match page_step_for_key(key) {
            Some(PageStep::Previous) => self.pager.prev_page(),
            Some(PageStep::Next) => self.pager.next_page(),
            None => {
                self.table.handle_key(key);
                return None;
            }
        };
        moved.then(|| self.request())
    }

    /// Replaces the cached page and clamps the cursor into the page range
    /// reported with it.
    pub fn apply(&mut self, requested_page: usize, page: JobPage, now: i64) {
        self.pager.apply(requested_page, page.total_size);
        self.entries = page.entries;
        self.table.set_rows(
            self.entries
                .iter()
                .map(|entry| row_for(self.set, entry, now))
                .collect(),
        );
        self.loader.succeed();
    }

    pub fn fail(&mut self) {
        self.loader.fail();
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let (table_width, table_height) = table_size(width, height);
        self.table.set_size(table_width, table_height);
    }

    pub fn set_styles(&mut self, styles: Styles) {
        self.styles = styles;
    }

    fn title(&self) -> &'static str {
        pane_for_set(self.set).label()
    }

    pub fn view(&self) -> Frame {
        if self.loader.waiting() {
            return message_box(self.title(), LOADING_MESSAGE, &self.styles, self.width, self.height);
        }
        if self.entries.is_empty() && self.pager.total_size() == 0 {
            return message_box(
                self.title(),
                self.table.empty_message(),
                &self.styles,
                self.width,
                self.height,
            );
        }

        let meta = meta_line(
            &self.styles,
            &[
                ("SIZE", format::number(self.pager.total_size())),
                (
                    "PAGE",
                    format!("{}/{}", self.pager.current_page(), self.pager.total_pages()),
                ),
            ],
        );
        Bordered::new(self.title())
            .meta(meta)
            .content(self.table.view(&self.styles))
            .padding(1)
            .style(self.styles.frame())
            .render(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::SortedSetView;
    use crate::app::FetchRequest;
    use crate::theme::Styles;
    use crate::views::LoadState;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use kiqdash_app::{JobPage, JobRecord, SortedEntry, SortedSet};
    use serde_json::json;

    const NOW: i64 = 1_767_225_600;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn entry(class: &str, at: i64) -> SortedEntry {
        SortedEntry::new(
            JobRecord::from_value(json!({
                "class": class,
                "queue": "default",
                "args": [1, "two"],
                "error_class": "RuntimeError",
                "error_message": "boom",
                "retry_count": 3,
            })),
            at as f64,
        )
    }

    fn page(count: usize, total_size: i64) -> JobPage {
        JobPage {
            entries: (0..count)
                .map(|index| entry("HardJob", NOW + index as i64 * 60))
                .collect(),
            total_size,
        }
    }

    fn sized(set: SortedSet) -> SortedSetView {
        let mut view = SortedSetView::new(set, Styles::default());
        view.set_size(120, 20);
        view
    }

    #[test]
    fn shows_loading_until_first_result() {
        let mut view = sized(SortedSet::Retry);
        assert_eq!(view.load_state(), LoadState::Uninitialized);
        view.init();
        assert_eq!(view.load_state(), LoadState::Loading);
        assert!(view.view().to_plain()[1].contains("Loading..."));
    }

    #[test]
    fn init_requests_first_page() {
        let mut view = sized(SortedSet::Dead);
        assert_eq!(
            view.init(),
            FetchRequest::Page {
                set: SortedSet::Dead,
                page: 1,
                offset: 0,
                limit: 25,
            }
        );
    }

    #[test]
    fn page_keys_move_within_bounds() {
        let mut view = sized(SortedSet::Retry);
        view.init();
        view.apply(1, page(25, 60), NOW);
        assert_eq!(view.pager().total_pages(), 3);

        assert_eq!(view.handle_key(key(KeyCode::Char('['))), None);
        let next = view.handle_key(key(KeyCode::Char(']')));
        assert_eq!(
            next,
            Some(FetchRequest::Page {
                set: SortedSet::Retry,
                page: 2,
                offset: 25,
                limit: 25,
            })
        );
        assert_eq!(view.load_state(), LoadState::Loading);
        view.handle_key(KeyEvent::new(KeyCode::Right, KeyModifiers::ALT));
        assert_eq!(view.pager().current_page(), 3);
        assert_eq!(view.handle_key(key(KeyCode::Char(']'))), None);
    }

    #[test]
    fn table_keys_never_fetch() {
        let mut view = sized(SortedSet::Schedule);
        view.init();
        view.apply(1, page(5, 5), NOW);
        for code in [KeyCode::Down, KeyCode::Char('j'), KeyCode::End, KeyCode::PageUp] {
            assert_eq!(view.handle_key(key(code)), None);
        }
        assert_eq!(view.table().selected(), Some(0));
    }

    #[test]
    fn page_three_of_an_empty_set_clamps_to_one() {
        let mut view = sized(SortedSet::Retry);
        view.init();
        view.apply(1, page(25, 75), NOW);
        view.handle_key(key(KeyCode::Char(']')));
        let request = view.handle_key(key(KeyCode::Char(']')));
        assert!(matches!(request, Some(FetchRequest::Page { page: 3, .. })));

        view.apply(3, JobPage::empty(), NOW);
        assert_eq!(view.pager().current_page(), 1);
        assert_eq!(view.pager().total_pages(), 1);
        let plain = view.view().to_plain();
        assert!(plain[1].contains("No retries"));
        assert!(!plain.iter().any(|line| line.contains("Error")));
    }

    #[test]
    fn failure_keeps_cached_rows() {
        let mut view = sized(SortedSet::Dead);
        view.init();
        view.apply(1, page(3, 3), NOW + 600);
        view.refresh();
        view.fail();
        assert_eq!(view.load_state(), LoadState::Ready);
        assert_eq!(view.entries().len(), 3);
        assert!(view.view().to_plain().iter().any(|line| line.contains("HardJob")));
    }

    #[test]
    fn first_failure_shows_empty_state() {
        let mut view = sized(SortedSet::Schedule);
        view.init();
        view.fail();
        assert!(view.view().to_plain()[1].contains("No scheduled jobs"));
    }

    #[test]
    fn rows_use_relative_times_and_meta() {
        let mut view = sized(SortedSet::Retry);
        view.init();
        view.apply(1, page(2, 30), NOW - 30);
        assert_eq!(view.table().rows()[0][0], "30s");
        assert_eq!(view.table().rows()[1][0], "1m30s");
        assert_eq!(view.table().rows()[0][5], "RuntimeError: boom");
        assert_eq!(view.table().rows()[0][4], "1, \"two\"");

        let top = &view.view().to_plain()[0];
        assert!(top.contains("Retries"));
        assert!(top.contains("SIZE: 30 • PAGE: 1/2"));
    }

    #[test]
    fn dead_rows_count_time_since_failure() {
        let mut view = sized(SortedSet::Dead);
        view.init();
        view.apply(1, page(1, 1), NOW + 3_600);
        assert_eq!(view.table().rows()[0][0], "1h0m");
        assert_eq!(view.table().rows()[0].len(), 5);
    }
}
