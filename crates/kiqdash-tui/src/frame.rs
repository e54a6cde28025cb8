// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Fixed-size text frames built on a character grid.
//!
//! Every [`Frame`] holds exactly `height` lines of exactly `width` display
//! columns, so sibling frames can be stacked or composited without
//! re-measuring. Widths are computed per grapheme cluster; styles never
//! contribute to width and terminal control sequences are stripped.

use crate::theme::BoxStyle;
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use std::borrow::Cow;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

pub const MIN_WIDTH: u16 = 4;
pub const MIN_HEIGHT: u16 = 3;

const TOP_LEFT: &str = "╭";
const TOP_RIGHT: &str = "╮";
const BOTTOM_LEFT: &str = "╰";
const BOTTOM_RIGHT: &str = "╯";
const HORIZONTAL: &str = "─";
const VERTICAL: &str = "│";
const TITLE_LEFT_FILL: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cell {
    symbol: String,
    style: Style,
    width: usize,
}

impl Cell {
    fn blank(style: Style) -> Self {
        Self {
            symbol: " ".to_owned(),
            style,
            width: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u16,
    height: u16,
    lines: Vec<Line<'static>>,
}

impl Frame {
    /// Fits `lines` into a `width` x `height` grid: long lines are
    /// truncated, short ones padded, missing lines left blank.
    pub fn new(lines: Vec<Line<'static>>, width: u16, height: u16) -> Self {
        let columns = usize::from(width);
        let mut fitted = lines
            .iter()
            .take(usize::from(height))
            .map(|line| fit_line(line, columns))
            .collect::<Vec<_>>();
        while fitted.len() < usize::from(height) {
            fitted.push(blank_line(columns));
        }
        Self {
            width,
            height,
            lines: fitted,
        }
    }

    pub fn blank(width: u16, height: u16) -> Self {
        Self::new(Vec::new(), width, height)
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    /// Stacks frames top to bottom. The result is as wide as the widest
    /// frame; narrower frames are padded on the right.
    pub fn stack(frames: impl IntoIterator<Item = Frame>) -> Self {
        let frames = frames.into_iter().collect::<Vec<_>>();
        let width = frames.iter().map(Frame::width).max().unwrap_or(0);
        let lines = frames
            .into_iter()
            .flat_map(|frame| frame.lines)
            .collect::<Vec<_>>();
        let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        Self::new(lines, width, height)
    }

    /// Composites `top` over this frame with its top-left corner at
    /// (`column`, `row`). Parts of `top` outside the frame are clipped.
    pub fn overlay(&self, top: &Frame, column: u16, row: u16) -> Self {
        let width = usize::from(self.width);
        let column = usize::from(column);
        let row = usize::from(row);
        let top_width = usize::from(top.width);

        let lines = self
            .lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let Some(top_line) = index.checked_sub(row).and_then(|at| top.lines.get(at)) else {
                    return line.clone();
                };
                if column >= width {
                    return line.clone();
                }
                let background = cells(line);
                let mut merged = slice_cells(&background, 0, column);
                merged.extend(slice_cells(&cells(top_line), 0, width - column));
                merged.extend(slice_cells(&background, column + top_width, width));
                line_from_cells(pad_cells(merged, width))
            })
            .collect();

        Self {
            width: self.width,
            height: self.height,
            lines,
        }
    }

    /// Unstyled text of every line.
    pub fn to_plain(&self) -> Vec<String> {
        self.lines.iter().map(plain_text).collect()
    }

    pub fn into_text(self) -> Text<'static> {
        Text::from(self.lines)
    }
}

/// A bordered box with its title (and optional meta line) embedded in the
/// top border:
///
/// ```text
/// ╭─ Title ──────── meta ─╮
/// │ content               │
/// ╰───────────────────────╯
/// ```
#[derive(Debug, Clone, Default)]
pub struct Bordered {
    title: String,
    meta: Option<Line<'static>>,
    content: Vec<Line<'static>>,
    padding: u16,
    style: BoxStyle,
}

impl Bordered {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn meta(mut self, meta: Line<'static>) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn content(mut self, content: Vec<Line<'static>>) -> Self {
        self.content = content;
        self
    }

    /// Blank columns between the side borders and the content.
    pub fn padding(mut self, padding: u16) -> Self {
        self.padding = padding;
        self
    }

    pub fn style(mut self, style: BoxStyle) -> Self {
        self.style = style;
        self
    }

    /// Renders at the requested size, clamped up to 4x3.
    pub fn render(&self, width: u16, height: u16) -> Frame {
        let width = width.max(MIN_WIDTH);
        let height = height.max(MIN_HEIGHT);
        let inner_width = usize::from(width - 2);
        let inner_height = usize::from(height - 2);
        let padding = usize::from(self.padding).min(inner_width / 2);
        let text_width = inner_width - padding * 2;

        let mut lines = Vec::with_capacity(usize::from(height));
        lines.push(self.top_border(inner_width));
        for index in 0..inner_height {
            let content = self
                .content
                .get(index)
                .map(|line| fit_line(line, text_width))
                .unwrap_or_else(|| blank_line(text_width));
            let mut spans = vec![Span::styled(VERTICAL, self.style.border)];
            if padding > 0 {
                spans.push(Span::raw(" ".repeat(padding)));
            }
            spans.extend(content.spans);
            if padding > 0 {
                spans.push(Span::raw(" ".repeat(padding)));
            }
            spans.push(Span::styled(VERTICAL, self.style.border));
            lines.push(Line::from(spans));
        }
        lines.push(Line::from(vec![
            Span::styled(BOTTOM_LEFT, self.style.border),
            Span::styled(HORIZONTAL.repeat(inner_width), self.style.border),
            Span::styled(BOTTOM_RIGHT, self.style.border),
        ]));

        Frame::new(lines, width, height)
    }

    fn top_border(&self, inner_width: usize) -> Line<'static> {
        let border = self.style.border;
        let title = Line::from(Span::styled(format!(" {} ", self.title), self.style.title));
        let title_width = line_width(&title);

        let mut interior = vec![Span::styled(HORIZONTAL.repeat(TITLE_LEFT_FILL), border)];
        interior.extend(title.spans);

        let used = TITLE_LEFT_FILL + title_width;
        let meta = self.meta.as_ref().map(|meta| {
            let mut spans = vec![Span::raw(" ")];
            spans.extend(meta.spans.iter().cloned());
            spans.push(Span::raw(" "));
            Line::from(spans)
        });
        match meta {
            // The meta block needs one fill column on each side.
            Some(meta) if used + 1 + line_width(&meta) + 1 <= inner_width => {
                let fill = inner_width - used - line_width(&meta) - 1;
                interior.push(Span::styled(HORIZONTAL.repeat(fill), border));
                interior.extend(meta.spans);
                interior.push(Span::styled(HORIZONTAL, border));
            }
            _ => {
                let fill = inner_width.saturating_sub(used);
                interior.push(Span::styled(HORIZONTAL.repeat(fill), border));
            }
        }

        // An over-long title loses its tail so both corners stay in place.
        let interior = fit_line(&Line::from(interior), inner_width);
        let mut spans = vec![Span::styled(TOP_LEFT, border)];
        spans.extend(interior.spans);
        spans.push(Span::styled(TOP_RIGHT, border));
        Line::from(spans)
    }
}

/// Display width of a line, ignoring styles and control sequences.
pub fn line_width(line: &Line<'_>) -> usize {
    cells(line).iter().map(|cell| cell.width).sum()
}

/// Display width of plain text.
pub fn text_width(text: &str) -> usize {
    line_width(&Line::raw(text))
}

/// Truncates or right-pads `line` to exactly `width` display columns.
pub fn fit_line(line: &Line<'_>, width: usize) -> Line<'static> {
    line_from_cells(pad_cells(slice_cells(&cells(line), 0, width), width))
}

/// Truncates or right-pads plain text to exactly `width` display columns.
pub fn fit_text(text: &str, width: usize) -> String {
    plain_text(&fit_line(&Line::raw(text), width))
}

pub fn plain_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}

fn blank_line(width: usize) -> Line<'static> {
    Line::raw(" ".repeat(width))
}

fn cells(line: &Line<'_>) -> Vec<Cell> {
    let mut out: Vec<Cell> = Vec::new();
    for span in &line.spans {
        let style = line.style.patch(span.style);
        let content = sanitize(&span.content);
        for grapheme in content.graphemes(true) {
            let width = UnicodeWidthStr::width(grapheme);
            if width == 0 {
                if let Some(last) = out.last_mut() {
                    last.symbol.push_str(grapheme);
                }
                continue;
            }
            out.push(Cell {
                symbol: grapheme.to_owned(),
                style,
                width,
            });
        }
    }
    out
}

// Columns [start, end). A wide glyph cut by either edge becomes blanks.
fn slice_cells(cells: &[Cell], start: usize, end: usize) -> Vec<Cell> {
    let mut out = Vec::new();
    let mut column = 0;
    for cell in cells {
        if column >= end {
            break;
        }
        let cell_end = column + cell.width;
        if column >= start && cell_end <= end {
            out.push(cell.clone());
        } else if cell_end > start {
            let visible = cell_end.min(end) - column.max(start);
            out.extend((0..visible).map(|_| Cell::blank(cell.style)));
        }
        column = cell_end;
    }
    out
}

fn pad_cells(mut cells: Vec<Cell>, width: usize) -> Vec<Cell> {
    let used: usize = cells.iter().map(|cell| cell.width).sum();
    cells.extend((used..width).map(|_| Cell::blank(Style::default())));
    cells
}

fn line_from_cells(cells: Vec<Cell>) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current = String::new();
    let mut current_style = None;
    for cell in cells {
        if current_style.is_some_and(|style| style != cell.style) {
            spans.push(Span::styled(
                std::mem::take(&mut current),
                current_style.unwrap_or_default(),
            ));
        }
        current_style = Some(cell.style);
        current.push_str(&cell.symbol);
    }
    if let Some(style) = current_style {
        spans.push(Span::styled(current, style));
    }
    Line::from(spans)
}

fn sanitize(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\u{1b}' => {
                // CSI sequences run to their final byte; lone escapes are dropped.
                if chars.next_if_eq(&'[').is_some() {
                    for next in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&next) {
                            break;
                        }
                    }
                }
            }
            '\t' => out.push(' '),
            ch if ch.is_control() => {}
            ch => out.push(ch),
        }
    }
    Cow::Owned(out)
}
