// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use super::{LOADING_MESSAGE, LoadState, Loader, message_box};
use crate::app::FetchRequest;
use crate::frame::{Bordered, Frame, fit_text};
use crate::theme::Styles;
use kiqdash_app::{Overview, PaneKind, format};
use ratatui::style::Style;
use ratatui::text::{Line, Span};

const LABEL_WIDTH: usize = 19;
const HINT: &str = "Press 1-6 to switch views, t to toggle theme, q to quit";

/// Two-column summary of job counters and the Redis server behind them.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewView {
    overview: Overview,
    updated_at: Option<i64>,
    loader: Loader,
    width: u16,
    height: u16,
    styles: Styles,
}

impl OverviewView {
    pub fn new(styles: Styles) -> Self {
        Self {
            overview: Overview::default(),
            updated_at: None,
            loader: Loader::default(),
            width: 0,
            height: 0,
            styles,
        }
    }

    pub fn overview(&self) -> &Overview {
        &self.overview
    }

    pub fn load_state(&self) -> LoadState {
        self.loader.state
    }

    pub fn init(&mut self) -> FetchRequest {
        self.refresh()
    }

    pub fn refresh(&mut self) -> FetchRequest {
        self.loader.start();
        FetchRequest::Overview
    }

    pub fn apply(&mut self, overview: Overview, now: i64) {
        self.overview = overview;
        self.updated_at = Some(now);
        self.loader.succeed();
    }

    pub fn fail(&mut self) {
        self.loader.fail();
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn set_styles(&mut self, styles: Styles) {
        self.styles = styles;
    }

    fn job_rows(&self) -> Vec<(&'static str, String, Style)> {
        let stats = self.overview.stats;
        let value = self.styles.metric_value;
        vec![
            ("Processed", format::number(stats.processed), value),
            ("Failed", format::number(stats.failed), self.styles.failure),
            ("Failure rate", format!("{:.2}%", stats.failure_rate()), value),
            ("Busy", format::number(stats.busy), value),
            ("Enqueued", format::number(stats.enqueued), value),
            ("Retries", format::number(stats.retries), value),
            ("Scheduled", format::number(stats.scheduled), value),
            ("Dead", format::number(stats.dead), value),
        ]
    }

    fn redis_rows(&self) -> Vec<(&'static str, String, Style)> {
        let redis = &self.overview.redis;
        let value = self.styles.metric_value;
        let version = if redis.version.is_empty() {
            "unknown".to_owned()
        } else {
            redis.version.clone()
        };
        vec![
            ("Version", version, value),
            ("Uptime", format::duration(redis.uptime_seconds), value),
            ("Connected clients", format::number(redis.connected_clients), value),
            ("Used memory", format::bytes(redis.used_memory), value),
            ("Peak memory", format::bytes(redis.used_memory_peak), value),
            ("Processes", self.overview.processes.to_string(), self.styles.success),
            (
                "Updated",
                self.updated_at.map(format::timestamp).unwrap_or_default(),
                self.styles.muted,
            ),
        ]
    }

    fn content(&self) -> Vec<Line<'static>> {
        let text_width = usize::from(self.width.saturating_sub(4));
        let column_width = (text_width / 2).max(1);

        let left = self.job_rows();
        let right = self.redis_rows();
        let mut lines = vec![Line::from(vec![
            Span::styled(fit_text("Jobs", column_width), self.styles.title),
            Span::styled("Redis", self.styles.title),
        ])];
        for index in 0..left.len().max(right.len()) {
            let mut spans = self.cell(left.get(index), column_width);
            spans.extend(self.cell(right.get(index), column_width));
            lines.push(Line::from(spans));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(HINT, self.styles.muted)));
        lines
    }

    fn cell(&self, row: Option<&(&'static str, String, Style)>, width: usize) -> Vec<Span<'static>> {
        let Some((label, value, style)) = row else {
            return vec![Span::raw(" ".repeat(width))];
        };
        let label = fit_text(label, LABEL_WIDTH.min(width));
        let value_width = width.saturating_sub(LABEL_WIDTH.min(width));
        vec![
            Span::styled(label, self.styles.metric_label),
            Span::styled(fit_text(value, value_width), *style),
        ]
    }

    pub fn view(&self) -> Frame {
        let title = PaneKind::Overview.label();
        if self.loader.waiting() {
            return message_box(title, LOADING_MESSAGE, &self.styles, self.width, self.height);
        }
        Bordered::new(title)
            .content(self.content())
            .padding(1)
            .style(self.styles.frame())
            .render(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::OverviewView;
    use crate::theme::Styles;
    use kiqdash_app::{Overview, RedisInfo, Stats};

    fn sample() -> Overview {
        Overview {
            stats: Stats {
                processed: 1_500,
                failed: 500,
                busy: 3,
                enqueued: 12,
                retries: 4,
                scheduled: 5,
                dead: 6,
            },
            redis: RedisInfo {
                version: "7.2.4".to_owned(),
                uptime_seconds: 90_000,
                connected_clients: 9,
                used_memory: 1_572_864,
                used_memory_peak: 2_097_152,
            },
            processes: 2,
        }
    }

    #[test]
    fn renders_both_columns() {
        let mut view = OverviewView::new(Styles::default());
        view.set_size(100, 16);
        view.init();
        view.apply(sample(), 0);

        let plain = view.view().to_plain();
        assert!(plain[0].contains("Dashboard"));
        assert!(plain[1].contains("Jobs"));
        assert!(plain[1].contains("Redis"));
        assert!(plain[2].contains("1.5K"));
        assert!(plain[2].contains("7.2.4"));
        assert!(plain[4].contains("25.00%"));
        assert!(plain[5].contains("1.5 MB"));
        assert!(plain.iter().any(|line| line.contains("1d1h")));
        assert!(plain[8].contains("Updated"));
        assert!(plain[8].contains("1970-01-01 00:00:00 UTC"));
        assert!(plain.iter().any(|line| line.contains("Press 1-6")));
    }

    #[test]
    fn stale_values_survive_a_failure() {
        let mut view = OverviewView::new(Styles::default());
        view.set_size(100, 16);
        view.init();
        view.apply(sample(), 0);
        view.refresh();
        view.fail();
        assert_eq!(view.overview(), &sample());
        assert!(view.view().to_plain()[2].contains("1.5K"));
    }
}
