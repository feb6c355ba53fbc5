//! TUI constants and configuration

use ratatui::style::Color;
use std::time::Duration;

/// Trailing window for the requests/second readout
pub const CURRENT_RATE_WINDOW: Duration = Duration::from_secs(10);

/// Short trend comparison period
pub const TREND_WINDOW: Duration = Duration::from_secs(60);

/// Long trend comparison period
pub const TREND_WINDOW_5M: Duration = Duration::from_secs(300);

/// Layout constraints for the main UI sections
pub mod layout {
    use ratatui::layout::Constraint;

    pub const HEADER_HEIGHT: u16 = 3;
    pub const LATENCY_HEIGHT: u16 = 4;
    pub const STATUS_HEIGHT: u16 = 8;
    pub const FOOTER_HEIGHT: u16 = 3;
    pub const MIN_TABLES_HEIGHT: u16 = 8;

    pub fn main_sections() -> [Constraint; 5] {
        [
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Length(LATENCY_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
            Constraint::Min(MIN_TABLES_HEIGHT),
            Constraint::Length(FOOTER_HEIGHT),
        ]
    }

    pub fn table_columns() -> [Constraint; 3] {
        [
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ]
    }
}

/// UI text styles
pub mod styles {
    use ratatui::style::Color;

    pub const LABEL: Color = Color::Gray;
    pub const VALUE_PRIMARY: Color = Color::Green;
    pub const VALUE_SECONDARY: Color = Color::Yellow;
    pub const VALUE_INFO: Color = Color::Cyan;
    pub const BORDER_ACTIVE: Color = Color::Cyan;
    pub const BORDER_NORMAL: Color = Color::White;
    pub const DIM: Color = Color::DarkGray;
}

/// Color for a status code class (2 for 2xx, etc.)
#[must_use]
pub fn status_class_color(class: u16) -> Color {
    match class {
        2 => Color::Green,
        3 => Color::Cyan,
        4 => Color::Yellow,
        5 => Color::Red,
        _ => Color::Gray,
    }
}

/// UI text constants
pub mod text {
    pub const ARROW_UP: &str = "↑";
    pub const ARROW_DOWN: &str = "↓";
    pub const ARROW_STABLE: &str = "→";
    pub const OTHER_LABEL: &str = "(other)";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_class_colors() {
        assert_eq!(status_class_color(2), Color::Green);
        assert_eq!(status_class_color(4), Color::Yellow);
        assert_eq!(status_class_color(5), Color::Red);
        assert_eq!(status_class_color(1), Color::Gray);
    }

    #[test]
    fn main_sections_shape() {
        assert_eq!(layout::main_sections().len(), 5);
        assert_eq!(layout::table_columns().len(), 3);
    }
}
