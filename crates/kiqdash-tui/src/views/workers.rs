// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use super::{LOADING_MESSAGE, LoadState, Loader, message_box, meta_line, table_size};
use crate::app::FetchRequest;
use crate::frame::{Bordered, Frame};
use crate::table::{Column, Table};
use crate::theme::Styles;
use crossterm::event::KeyEvent;
use kiqdash_app::{PaneKind, WorkerEntry, WorkerSnapshot, format};

const COLUMNS: [Column; 6] = [
    Column::new("Process", 24),
    Column::new("TID", 10),
    Column::new("Queue", 15),
    Column::new("Job", 30),
    Column::new("Arguments", 40),
    Column::new("Started", 10),
];

fn row_for(worker: &WorkerEntry, now: i64) -> Vec<String> {
    vec![
        worker.process.clone(),
        worker.thread_id.clone(),
        worker.queue.clone(),
        worker.job.display_class().to_owned(),
        format::args(worker.job.display_args()),
        format::duration(now - worker.run_at),
    ]
}

/// Jobs currently being worked on, across every live process.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkersView {
    snapshot: WorkerSnapshot,
    table: Table,
    loader: Loader,
    width: u16,
    height: u16,
    styles: Styles,
}

impl WorkersView {
    pub fn new(styles: Styles) -> Self {
        Self {
            snapshot: WorkerSnapshot::default(),
            table: Table::new(COLUMNS.to_vec(), "No active workers"),
            loader: Loader::default(),
            width: 0,
            height: 0,
            styles,
        }
    }

    pub fn snapshot(&self) -> &WorkerSnapshot {
        &self.snapshot
    }

    pub fn load_state(&self) -> LoadState {
        self.loader.state
    }

    pub fn init(&mut self) -> FetchRequest {
        self.refresh()
    }

    pub fn refresh(&mut self) -> FetchRequest {
        self.loader.start();
        FetchRequest::Workers
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<FetchRequest> {
        self.table.handle_key(key);
        None
    }

    pub fn apply(&mut self, snapshot: WorkerSnapshot, now: i64) {
        self.table.set_rows(
            snapshot
                .workers
                .iter()
                .map(|worker| row_for(worker, now))
                .collect(),
        );
        self.snapshot = snapshot;
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

    pub fn view(&self) -> Frame {
        let title = PaneKind::Workers.label();
        if self.loader.waiting() {
            return message_box(title, LOADING_MESSAGE, &self.styles, self.width, self.height);
        }
        let meta = meta_line(
            &self.styles,
            &[
                ("PROCESSES", self.snapshot.processes.len().to_string()),
                (
                    "BUSY",
                    format!(
                        "{}/{}",
                        self.snapshot.busy_count(),
                        self.snapshot.thread_count()
                    ),
                ),
            ],
        );
        Bordered::new(title)
            .meta(meta)
            .content(self.table.view(&self.styles))
            .padding(1)
            .style(self.styles.frame())
            .render(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::WorkersView;
    use crate::theme::Styles;
    use kiqdash_app::WorkerSnapshot;
    use kiqdash_testkit::{DemoCluster, REFERENCE_NOW};

    #[test]
    fn rows_follow_snapshot() {
        let cluster = DemoCluster::generate(21, REFERENCE_NOW);
        let mut view = WorkersView::new(Styles::default());
        view.set_size(140, 30);
        view.init();
        view.apply(cluster.workers(), REFERENCE_NOW);

        let snapshot = cluster.workers();
        let plain = view.view().to_plain();
        assert!(plain[0].contains(&format!(
            "PROCESSES: {} • BUSY: {}/{}",
            snapshot.processes.len(),
            snapshot.busy_count(),
            snapshot.thread_count()
        )));
        assert_eq!(view.snapshot(), &snapshot);
    }

    #[test]
    fn idle_cluster_shows_empty_message() {
        let mut view = WorkersView::new(Styles::default());
        view.set_size(80, 10);
        view.init();
        view.apply(WorkerSnapshot::default(), REFERENCE_NOW);
        assert!(view.view().to_plain().iter().any(|line| line.contains("No active workers")));
    }
}
