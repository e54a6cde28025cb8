// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::frame::fit_text;
use crate::theme::Styles;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::text::{Line, Span};

const HEADER_ROWS: u16 = 2;
const COLUMN_GAP: &str = " ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub title: &'static str,
    pub width: u16,
}

impl Column {
    pub const fn new(title: &'static str, width: u16) -> Self {
        Self { title, width }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableCommand {
    MoveRow(isize),
    PageDown,
    PageUp,
    First,
    Last,
}

fn table_command_for_key(key: KeyEvent) -> Option<TableCommand> {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => Some(TableCommand::MoveRow(1)),
        KeyCode::Up | KeyCode::Char('k') => Some(TableCommand::MoveRow(-1)),
        KeyCode::PageDown => Some(TableCommand::PageDown),
        KeyCode::PageUp => Some(TableCommand::PageUp),
        KeyCode::Home | KeyCode::Char('g') => Some(TableCommand::First),
        KeyCode::End | KeyCode::Char('G') => Some(TableCommand::Last),
        _ => None,
    }
}

/// Rows of pre-formatted cells shown through a scrolling window with one
/// selected row. Navigation only moves the window; loading rows is up to
/// the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
    empty_message: String,
    width: u16,
    height: u16,
    offset: usize,
    cursor: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>, empty_message: impl Into<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            empty_message: empty_message.into(),
            width: 0,
            height: 0,
            offset: 0,
            cursor: 0,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn empty_message(&self) -> &str {
        &self.empty_message
    }

    pub fn set_rows(&mut self, rows: Vec<Vec<String>>) {
        self.rows = rows;
        self.clamp();
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.clamp();
    }

    pub fn selected(&self) -> Option<usize> {
        (!self.rows.is_empty()).then_some(self.cursor)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Rows that fit below the header and separator, at least one.
    pub fn visible_rows(&self) -> usize {
        usize::from(self.height.saturating_sub(HEADER_ROWS)).max(1)
    }

    /// Applies a navigation key. Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let Some(command) = table_command_for_key(key) else {
            return false;
        };
        let page = self.visible_rows() as isize;
        match command {
            TableCommand::MoveRow(delta) => self.move_cursor(delta),
            TableCommand::PageDown => self.move_cursor(page),
            TableCommand::PageUp => self.move_cursor(-page),
            TableCommand::First => self.move_cursor(isize::MIN),
            TableCommand::Last => self.move_cursor(isize::MAX),
        }
        true
    }

    fn move_cursor(&mut self, delta: isize) {
        self.cursor = self.cursor.saturating_add_signed(delta);
        self.clamp();
    }

    fn clamp(&mut self) {
        let last = self.rows.len().saturating_sub(1);
        self.cursor = self.cursor.min(last);
        let visible = self.visible_rows();
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + visible {
            self.offset = self.cursor + 1 - visible;
        }
        let max_offset = self.rows.len().saturating_sub(visible);
        self.offset = self.offset.min(max_offset);
    }

    /// Header, separator and the visible window of rows. Lines are not
    /// padded to the table width; the enclosing frame does that.
    pub fn view(&self, styles: &Styles) -> Vec<Line<'static>> {
        let header = self
            .columns
            .iter()
            .map(|column| fit_text(column.title, usize::from(column.width)))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP);
        let separator_width = self
            .columns
            .iter()
            .map(|column| usize::from(column.width))
            .sum::<usize>()
            + self.columns.len().saturating_sub(1);
        let separator_width = separator_width.min(usize::from(self.width).max(1));

        let mut lines = vec![
            Line::from(Span::styled(header, styles.table_header)),
            Line::from(Span::styled("─".repeat(separator_width), styles.table_separator)),
        ];

        if self.rows.is_empty() {
            lines.push(Line::from(Span::styled(
                self.empty_message.clone(),
                styles.muted,
            )));
            return lines;
        }

        let window = self
            .rows
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(self.visible_rows());
        for (index, row) in window {
            let text = self
                .columns
                .iter()
                .enumerate()
                .map(|(column_index, column)| {
                    let cell = row.get(column_index).map(String::as_str).unwrap_or("");
                    fit_text(cell, usize::from(column.width))
                })
                .collect::<Vec<_>>()
                .join(COLUMN_GAP);
            let style = if index == self.cursor {
                styles.table_selected
            } else {
                styles.text
            };
            lines.push(Line::from(Span::styled(text, style)));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, Table};
    use crate::frame::plain_text;
    use crate::theme::Styles;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn table_with_rows(count: usize, height: u16) -> Table {
        let mut table = Table::new(
            vec![Column::new("Name", 6), Column::new("Size", 4)],
            "Nothing here",
        );
        table.set_size(20, height);
        table.set_rows(
            (0..count)
                .map(|index| vec![format!("row{index}"), index.to_string()])
                .collect(),
        );
        table
    }

    #[test]
    fn empty_table_has_no_selection() {
        let mut table = table_with_rows(0, 5);
        assert_eq!(table.selected(), None);
        assert!(table.handle_key(key(KeyCode::Down)));
        assert_eq!(table.selected(), None);

        let lines = table.view(&Styles::default());
        assert_eq!(plain_text(&lines[2]), "Nothing here");
    }

    #[test]
    fn cursor_and_offset_stay_in_range() {
        let mut table = table_with_rows(10, 5);
        assert_eq!(table.visible_rows(), 3);

        for _ in 0..20 {
            table.handle_key(key(KeyCode::Char('j')));
        }
        assert_eq!(table.selected(), Some(9));
        assert_eq!(table.offset(), 7);

        table.handle_key(key(KeyCode::PageUp));
        assert_eq!(table.selected(), Some(6));
        table.handle_key(key(KeyCode::Char('g')));
        assert_eq!((table.selected(), table.offset()), (Some(0), 0));
        table.handle_key(key(KeyCode::End));
        assert_eq!(table.selected(), Some(9));
        table.handle_key(key(KeyCode::Up));
        assert_eq!(table.selected(), Some(8));
    }

    #[test]
    fn shrinking_rows_clamps_selection() {
        let mut table = table_with_rows(10, 5);
        table.handle_key(key(KeyCode::Char('G')));
        table.set_rows(vec![vec!["only".to_owned(), "1".to_owned()]]);
        assert_eq!((table.selected(), table.offset()), (Some(0), 0));

        table.set_rows(Vec::new());
        assert_eq!(table.selected(), None);
    }

    #[test]
    fn unknown_keys_are_not_consumed() {
        let mut table = table_with_rows(3, 5);
        assert!(!table.handle_key(key(KeyCode::Char('['))));
        assert!(!table.handle_key(key(KeyCode::Left)));
    }

    #[test]
    fn cells_are_truncated_to_column_width() {
        let mut table = Table::new(vec![Column::new("Queue", 4), Column::new("Job", 5)], "");
        table.set_size(20, 4);
        table.set_rows(vec![vec!["critical".to_owned(), "Mailer".to_owned()]]);

        let lines = table
            .view(&Styles::default())
            .iter()
            .map(plain_text)
            .collect::<Vec<_>>();
        assert_eq!(lines, vec!["Queu Job  ", "──────────", "crit Maile"]);
    }

    #[test]
    fn window_follows_cursor() {
        let mut table = table_with_rows(6, 4);
        table.handle_key(key(KeyCode::PageDown));
        table.handle_key(key(KeyCode::PageDown));
        let lines = table.view(&Styles::default());
        assert_eq!(lines.len(), 4);
        assert!(plain_text(&lines[2]).starts_with("row3"));
        assert!(plain_text(&lines[3]).starts_with("row4"));
        assert_eq!(table.selected(), Some(4));
    }
}
