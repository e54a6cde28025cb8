// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::frame::Frame;
use crate::theme::Styles;
use kiqdash_app::PaneKind;
use ratatui::text::{Line, Span};

const HINTS: [(&str, &str); 2] = [("t", "theme"), ("q", "quit")];

/// The one-line strip of pane hotkeys along the bottom of the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Navbar {
    width: u16,
    styles: Styles,
}

impl Navbar {
    pub const HEIGHT: u16 = 1;

    pub fn new(styles: Styles) -> Self {
        Self { width: 0, styles }
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

    pub fn view(&self, active: PaneKind) -> Frame {
        let mut spans = vec![Span::raw(" ")];
        for pane in PaneKind::ALL {
            let item_style = if pane == active {
                self.styles.nav_active
            } else {
                self.styles.nav_item
            };
            spans.push(Span::styled(format!(" {} ", pane.hotkey()), self.styles.nav_key));
            spans.push(Span::styled(format!(" {} ", pane.label()), item_style));
        }
        for (key, label) in HINTS {
            spans.push(Span::styled(format!(" {key} "), self.styles.nav_key));
            spans.push(Span::styled(format!(" {label} "), self.styles.nav_item));
        }
        Frame::new(vec![Line::from(spans)], self.width, Self::HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::Navbar;
    use crate::theme::Styles;
    use kiqdash_app::PaneKind;

    #[test]
    fn lists_every_pane_then_hints() {
        let mut navbar = Navbar::new(Styles::default());
        navbar.set_width(200);
        let line = navbar.view(PaneKind::Queues).to_plain().remove(0);
        assert!(line.starts_with("  1  Dashboard  2  Busy  3  Queues "));
        assert!(line.trim_end().ends_with("t  theme  q  quit"));
        assert_eq!(line.chars().count(), 200);
    }

    #[test]
    fn highlights_active_pane() {
        let styles = Styles::default();
        let mut navbar = Navbar::new(styles);
        navbar.set_width(120);
        let frame = navbar.view(PaneKind::Dead);
        let active = frame.lines()[0]
            .spans
            .iter()
            .find(|span| span.content.contains("Dead"))
            .map(|span| span.style);
        assert_eq!(active, Some(styles.nav_active));
    }
}
