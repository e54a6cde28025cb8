// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::frame::{Bordered, Frame, MIN_HEIGHT, MIN_WIDTH};
use crate::theme::Styles;
use ratatui::text::{Line, Span};

const TITLE: &str = "Connection Error";
const MAX_WIDTH: u16 = 72;
const PADDING: u16 = 1;

/// Centered box reporting the latest fetch failure over the content area.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPopup {
    width: u16,
    height: u16,
    styles: Styles,
}

impl ErrorPopup {
    pub fn new(styles: Styles) -> Self {
        Self {
            width: 0,
            height: 0,
            styles,
        }
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn set_styles(&mut self, styles: Styles) {
        self.styles = styles;
    }

    /// Composites the popup over `background`, which keeps its size.
    pub fn render(&self, background: &Frame, message: &str) -> Frame {
        let area_width = background.width().min(self.width.max(MIN_WIDTH));
        let area_height = background.height().min(self.height.max(MIN_HEIGHT));

        let width = (area_width.saturating_mul(2) / 3)
            .max(TITLE.len() as u16 + 6)
            .min(MAX_WIDTH)
            .min(area_width);
        let text_width = usize::from(width.saturating_sub(2 + PADDING * 2)).max(1);

        let mut content = vec![Line::raw("")];
        content.extend(textwrap::wrap(message, text_width).into_iter().map(|line| {
            Line::from(Span::styled(line.into_owned(), self.styles.error_message))
        }));
        content.push(Line::raw(""));

        let wanted = u16::try_from(content.len()).unwrap_or(u16::MAX).saturating_add(2);
        let height = wanted.min(area_height);

        let popup = Bordered::new(TITLE)
            .content(content)
            .padding(PADDING)
            .style(self.styles.error_frame())
            .render(width, height);

        let column = background.width().saturating_sub(popup.width()) / 2;
        let row = background.height().saturating_sub(popup.height()) / 2;
        background.overlay(&popup, column, row)
    }
}
