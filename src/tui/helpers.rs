//! TUI rendering helper functions

use crate::store::StatusCountItem;
use ratatui::layout::Rect;
use std::time::Duration;

/// Format a count with thousands separators (1234567 → "1,234,567")
#[must_use]
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format an elapsed duration as a compact human-readable string
#[must_use]
pub fn format_uptime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Status codes of one class (2xx, 4xx, ...) with class totals
#[derive(Debug, Clone, PartialEq)]
pub struct StatusClass {
    /// Class digit: 2 for 2xx, 5 for 5xx
    pub class: u16,
    pub total: u64,
    /// Share of all counted entries, as a percentage
    pub percentage: f64,
    /// Individual codes, sorted by count descending
    pub codes: Vec<StatusCountItem>,
}

/// Group per-code counts into status classes for display
///
/// Only classes that actually occurred are returned, ordered 1xx..5xx.
/// Codes within a class are sorted by count descending (ties by code).
#[must_use]
pub fn group_status_classes(counts: &[StatusCountItem]) -> Vec<StatusClass> {
    let total: u64 = counts.iter().map(|item| item.count).sum();
    if total == 0 {
        return Vec::new();
    }

    let mut classes = Vec::new();
    for class in 1..=5u16 {
        let mut codes: Vec<StatusCountItem> = counts
            .iter()
            .filter(|item| item.status / 100 == class)
            .copied()
            .collect();
        if codes.is_empty() {
            continue;
        }
        codes.sort_unstable_by(|a, b| b.count.cmp(&a.count).then(a.status.cmp(&b.status)));

        let class_total: u64 = codes.iter().map(|item| item.count).sum();
        classes.push(StatusClass {
            class,
            total: class_total,
            percentage: class_total as f64 * 100.0 / total as f64,
            codes,
        });
    }
    classes
}

/// Centered sub-rectangle for modal overlays
#[must_use]
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
