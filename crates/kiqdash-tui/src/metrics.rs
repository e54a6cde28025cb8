// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::frame::{Frame, text_width};
use crate::theme::Styles;
use kiqdash_app::{Stats, format};
use ratatui::text::{Line, Span};

const ITEM_GAP: usize = 3;
const EDGE: usize = 1;

/// The one-line strip of global counters across the top of the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsStrip {
    data: Stats,
    width: u16,
    styles: Styles,
}

impl MetricsStrip {
    pub const HEIGHT: u16 = 1;

    pub fn new(styles: Styles) -> Self {
        Self {
            data: Stats::default(),
            width: 0,
            styles,
        }
    }

    pub fn data(&self) -> Stats {
        self.data
    }

    pub fn set_data(&mut self, data: Stats) {
        self.data = data;
    }

    pub fn set_width(&mut self, width: u16) {
        self.width = width;
    }

    pub fn set_styles(&mut self, styles: Styles) {
        self.styles = styles;
    }

    pub fn height(&self) -> u16 {
        Self::HEIGHT
    }

    pub fn view(&self) -> Frame {
        let items = metric_items(self.data);
        let widths = items
            .iter()
            .map(|(label, value)| text_width(label) + text_width(value))
            .collect::<Vec<_>>();
        let pads = cell_padding(&widths, usize::from(self.width));

        let fill = self.styles.metrics_fill;
        let mut spans = vec![Span::styled(" ".repeat(EDGE), fill)];
        for (index, ((label, value), pad)) in items.into_iter().zip(pads).enumerate() {
            if index > 0 {
                spans.push(Span::styled(" ".repeat(ITEM_GAP), self.styles.metrics_separator));
            }
            spans.push(Span::styled(label, self.styles.metrics_label));
            spans.push(Span::styled(value, self.styles.metrics_value));
            if pad > 0 {
                spans.push(Span::styled(" ".repeat(pad), fill));
            }
        }
        spans.push(Span::styled(" ".repeat(EDGE), fill));

        Frame::new(vec![Line::from(spans)], self.width, Self::HEIGHT)
    }
}

fn metric_items(data: Stats) -> Vec<(String, String)> {
    [
        ("Processed", data.processed),
        ("Failed", data.failed),
        ("Busy", data.busy),
        ("Enqueued", data.enqueued),
        ("Retries", data.retries),
        ("Scheduled", data.scheduled),
        ("Dead", data.dead),
    ]
    .into_iter()
    .map(|(label, value)| (format!("{label}: "), format::number(value)))
    .collect()
}

/// Trailing padding for each item of the strip.
///
/// Items are padded to a common width when `width` allows it; any extra
/// space is spread over the items, leftmost first. When the common width
/// does not fit, padding is taken back one column at a time from the
/// leftmost padded items. Below the tightest layout every pad is zero and
/// the caller truncates.
pub fn cell_padding(widths: &[usize], width: usize) -> Vec<usize> {
    let count = widths.len();
    if count == 0 {
        return Vec::new();
    }
    let widest = widths.iter().copied().max().unwrap_or(0);
    let fixed = ITEM_GAP * (count - 1) + EDGE * 2;
    let equal_total = widest * count + fixed;
    let min_total = widths.iter().sum::<usize>() + fixed;

    if width < min_total {
        return vec![0; count];
    }

    let mut pads = widths.iter().map(|item| widest - item).collect::<Vec<_>>();
    if width >= equal_total {
        let extra = width - equal_total;
        for (index, pad) in pads.iter_mut().enumerate() {
            *pad += extra / count + usize::from(index < extra % count);
        }
        return pads;
    }

    let mut deficit = equal_total - width;
    while deficit > 0 {
        for pad in pads.iter_mut().filter(|pad| **pad > 0) {
            if deficit == 0 {
                break;
            }
            *pad -= 1;
            deficit -= 1;
        }
    }
    pads
}
