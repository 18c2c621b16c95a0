// =============================================================================
// Two-point measurement
// =============================================================================
//
// Reports how far the value moved and how much time passed between two picked
// chart points. Time is broken into whole days, hours and minutes; leftover
// seconds are truncated and zero components are left out of the label.

use serde::{Deserialize, Serialize};

const MS_PER_MINUTE: i64 = 60 * 1000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// A picked chart location: value on the y axis, epoch milliseconds on x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayAnchor {
    pub value: f64,
    pub timestamp: i64,
}

/// Derived summary of a completed measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayAnnotation {
    /// `end.value - start.value`.
    pub delta: f64,
    pub delta_label: String,
    pub elapsed_label: String,
}

impl OverlayAnnotation {
    /// Text shown next to the measurement box.
    pub fn label(&self) -> String {
        format!("{}, {}", self.delta_label, self.elapsed_label)
    }
}

/// Measure from `start` to `end`.
pub fn resolve_overlay(start: &OverlayAnchor, end: &OverlayAnchor) -> OverlayAnnotation {
    let delta = end.value - start.value;
    OverlayAnnotation {
        delta,
        delta_label: format_delta(delta),
        elapsed_label: format_elapsed(end.timestamp.abs_diff(start.timestamp)),
    }
}

/// Two decimals, with an explicit `+` on non-negative values. Negative zero
/// counts as zero.
pub fn format_delta(delta: f64) -> String {
    let delta = if delta == 0.0 { 0.0 } else { delta };
    if delta >= 0.0 {
        format!("+{delta:.2}")
    } else {
        format!("{delta:.2}")
    }
}

/// Render a span in milliseconds as e.g. `"1d 2hr 5min"`. Spans under one
/// minute render as an empty string.
pub fn format_elapsed(span_ms: u64) -> String {
    let span = i64::try_from(span_ms).unwrap_or(i64::MAX);
    let days = span / MS_PER_DAY;
    let hours = (span % MS_PER_DAY) / MS_PER_HOUR;
    let minutes = (span % MS_PER_HOUR) / MS_PER_MINUTE;

    let mut label = String::new();
    if days > 0 {
        label.push_str(&format!("{days}d "));
    }
    if hours > 0 {
        label.push_str(&format!("{hours}hr "));
    }
    if minutes > 0 {
        label.push_str(&format!("{minutes}min"));
    }
    label
}
