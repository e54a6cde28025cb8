// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use super::{LOADING_MESSAGE, LoadState, Loader, message_box, meta_line, table_size};
use crate::app::FetchRequest;
use crate::frame::{Bordered, Frame};
use crate::table::{Column, Table};
use crate::theme::Styles;
use crossterm::event::KeyEvent;
use kiqdash_app::{PaneKind, QueueSummary, format};

const COLUMNS: [Column; 3] = [
    Column::new("Queue", 30),
    Column::new("Size", 10),
    Column::new("Latency", 12),
];

#[derive(Debug, Clone, PartialEq)]
pub struct QueuesView {
    queues: Vec<QueueSummary>,
    table: Table,
    loader: Loader,
    width: u16,
    height: u16,
    styles: Styles,
}

impl QueuesView {
    pub fn new(styles: Styles) -> Self {
        Self {
            queues: Vec::new(),
            table: Table::new(COLUMNS.to_vec(), "No queues"),
            loader: Loader::default(),
            width: 0,
            height: 0,
            styles,
        }
    }

    pub fn queues(&self) -> &[QueueSummary] {
        &self.queues
    }

    pub fn load_state(&self) -> LoadState {
        self.loader.state
    }

    pub fn init(&mut self) -> FetchRequest {
        self.refresh()
    }

    pub fn refresh(&mut self) -> FetchRequest {
        self.loader.start();
        FetchRequest::Queues
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<FetchRequest> {
        self.table.handle_key(key);
        None
    }

    pub fn apply(&mut self, queues: Vec<QueueSummary>) {
        self.table.set_rows(
            queues
                .iter()
                .map(|queue| {
                    vec![
                        queue.name.clone(),
                        format::number(queue.size),
                        format::duration(queue.latency.round() as i64),
                    ]
                })
                .collect(),
        );
        self.queues = queues;
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
        let title = PaneKind::Queues.label();
        if self.loader.waiting() {
            return message_box(title, LOADING_MESSAGE, &self.styles, self.width, self.height);
        }
        let enqueued = self.queues.iter().map(|queue| queue.size).sum::<i64>();
        let meta = meta_line(
            &self.styles,
            &[
                ("QUEUES", self.queues.len().to_string()),
                ("ENQUEUED", format::number(enqueued)),
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
