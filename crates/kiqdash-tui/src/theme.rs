// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use kiqdash_app::ThemeMode;
use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Palette {
    primary: Color,
    text: Color,
    text_muted: Color,
    border: Color,
    metrics_bar_bg: Color,
    metrics_text: Color,
    metrics_sep_bg: Color,
    selected_fg: Color,
    selected_bg: Color,
    success: Color,
    error: Color,
}

const DARK: Palette = Palette {
    primary: Color::Rgb(0xF7, 0x3D, 0x68),
    text: Color::Rgb(0xF9, 0xFA, 0xFB),
    text_muted: Color::Rgb(0x9C, 0xA3, 0xAF),
    border: Color::Rgb(0x37, 0x41, 0x51),
    metrics_bar_bg: Color::Rgb(0x4D, 0xAB, 0xF7),
    metrics_text: Color::Rgb(0x21, 0x25, 0x29),
    metrics_sep_bg: Color::Rgb(0x33, 0x9A, 0xF0),
    selected_fg: Color::Indexed(229),
    selected_bg: Color::Indexed(57),
    success: Color::Rgb(0x22, 0xC5, 0x5E),
    error: Color::Rgb(0xFF, 0x00, 0x00),
};

const LIGHT: Palette = Palette {
    primary: Color::Rgb(0xB2, 0x00, 0x3C),
    text: Color::Rgb(0x11, 0x18, 0x27),
    text_muted: Color::Rgb(0x6B, 0x72, 0x80),
    border: Color::Rgb(0xD1, 0xD5, 0xDB),
    metrics_bar_bg: Color::Rgb(0x1C, 0x7E, 0xD6),
    metrics_text: Color::Rgb(0xF8, 0xF9, 0xFA),
    metrics_sep_bg: Color::Rgb(0x19, 0x71, 0xC2),
    selected_fg: Color::Indexed(229),
    selected_bg: Color::Indexed(57),
    success: Color::Rgb(0x16, 0xA3, 0x4A),
    error: Color::Rgb(0xFF, 0x00, 0x00),
};

/// Border and title styles of one bordered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoxStyle {
    pub border: Style,
    pub title: Style,
}

/// Styles derived from the active palette. Every component keeps its own
/// copy and receives a fresh one when the theme changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Styles {
    pub mode: ThemeMode,
    pub title: Style,
    pub text: Style,
    pub muted: Style,
    pub border: Style,
    pub metric_label: Style,
    pub metric_value: Style,
    pub metrics_fill: Style,
    pub metrics_label: Style,
    pub metrics_value: Style,
    pub metrics_separator: Style,
    pub table_header: Style,
    pub table_selected: Style,
    pub table_separator: Style,
    pub nav_key: Style,
    pub nav_item: Style,
    pub nav_active: Style,
    pub success: Style,
    pub failure: Style,
    pub error_title: Style,
    pub error_border: Style,
    pub error_message: Style,
}

impl Styles {
    pub fn for_mode(mode: ThemeMode) -> Self {
        let palette = match mode {
            ThemeMode::Dark => DARK,
            ThemeMode::Light => LIGHT,
        };
        let bold = Modifier::BOLD;
        Self {
            mode,
            title: Style::default().fg(palette.primary).add_modifier(bold),
            text: Style::default().fg(palette.text),
            muted: Style::default().fg(palette.text_muted),
            border: Style::default().fg(palette.border),
            metric_label: Style::default().fg(palette.text_muted),
            metric_value: Style::default().fg(palette.text).add_modifier(bold),
            metrics_fill: Style::default().bg(palette.metrics_bar_bg),
            metrics_label: Style::default()
                .fg(palette.metrics_text)
                .bg(palette.metrics_bar_bg),
            metrics_value: Style::default()
                .fg(palette.metrics_text)
                .bg(palette.metrics_bar_bg)
                .add_modifier(bold),
            metrics_separator: Style::default().bg(palette.metrics_sep_bg),
            table_header: Style::default().fg(palette.text).add_modifier(bold),
            table_selected: Style::default()
                .fg(palette.selected_fg)
                .bg(palette.selected_bg),
            table_separator: Style::default().fg(palette.border),
            nav_key: Style::default().fg(palette.text).bg(palette.border),
            nav_item: Style::default().fg(palette.text_muted),
            nav_active: Style::default().fg(palette.primary).add_modifier(bold),
            success: Style::default().fg(palette.success),
            failure: Style::default().fg(palette.error),
            error_title: Style::default().fg(palette.error).add_modifier(bold),
            error_border: Style::default().fg(palette.error),
            error_message: Style::default().fg(palette.text_muted),
        }
    }

    pub fn frame(&self) -> BoxStyle {
        BoxStyle {
            border: self.border,
            title: self.title,
        }
    }

    pub fn error_frame(&self) -> BoxStyle {
        BoxStyle {
            border: self.error_border,
            title: self.error_title,
        }
    }
}

impl Default for Styles {
    fn default() -> Self {
        Self::for_mode(ThemeMode::Dark)
    }
}

#[cfg(test)]
mod tests {
    use super::Styles;
    use kiqdash_app::ThemeMode;

    #[test]
    fn modes_produce_distinct_palettes() {
        let dark = Styles::for_mode(ThemeMode::Dark);
        let light = Styles::for_mode(ThemeMode::Light);
        assert_ne!(dark.title, light.title);
        assert_ne!(dark.metrics_fill, light.metrics_fill);
        assert_eq!(dark.table_selected, light.table_selected);
        assert_eq!(Styles::default(), dark);
    }
}
