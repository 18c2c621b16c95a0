// =============================================================================
// Render Adapter — draw decisions over a visible window
// =============================================================================
//
// The rendering engine owns the canvas and the coordinate system. On every
// repaint it hands an indicator a `DrawContext` (visible index window, axis
// converters, precomputed result) and gets back plain draw instructions. Nothing
// here paints; this module only decides *what* to draw and *where*.

use std::ops::Range;

use serde::Serialize;

use crate::indicators::IndicatorResult;

// =============================================================================
// Coordinate conversion (supplied by the engine)
// =============================================================================

/// Maps a data-space value to a pixel position along one axis.
pub trait CoordinateAxis {
    fn convert_to_pixel(&self, value: f64) -> f64;
}

/// Identity axis: leaves values in data space. Used when the consumer (e.g. a
/// browser chart) does its own pixel mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataSpaceAxis;

impl CoordinateAxis for DataSpaceAxis {
    fn convert_to_pixel(&self, value: f64) -> f64 {
        value
    }
}

/// A point already mapped to pixel space by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

/// Everything an indicator sees during one repaint.
pub struct DrawContext<'a> {
    /// Half-open `[from, to)` range of visible candle indices.
    pub visible_range: Range<usize>,
    pub x_axis: &'a dyn CoordinateAxis,
    pub y_axis: &'a dyn CoordinateAxis,
    pub result: &'a IndicatorResult,
}

impl DrawContext<'_> {
    /// The visible range clipped to the result length, so a stale viewport can
    /// never index past the data.
    pub fn clamped_range(&self) -> Range<usize> {
        let len = self.result.len();
        let end = self.visible_range.end.min(len);
        let start = self.visible_range.start.min(end);
        start..end
    }
}

// =============================================================================
// Draw output
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawInstruction {
    /// Filled circle centred on `(x, y)`.
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        color: String,
    },
}

/// Result of an indicator's `draw` step.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DrawOutput {
    pub instructions: Vec<DrawInstruction>,
    /// Whether the engine should still draw the indicator's default figures
    /// (e.g. a `Line` figure) after the custom instructions.
    pub default_figures: bool,
}

/// Marker styling for trade annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub buy_color: String,
    pub sell_color: String,
    pub radius: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            buy_color: "#FF007F".to_string(),
            sell_color: "#90EE90".to_string(),
            radius: 4.0,
        }
    }
}

// =============================================================================
// Overlay figures
// =============================================================================

/// Primitive figure an overlay asks the engine to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayFigure {
    /// Stroked and filled rectangle with top-left corner `(x, y)`.
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Horizontal line across the pane at `y`.
    HorizontalLine { y: f64 },
    /// Label that does not take pointer events.
    Text { x: f64, y: f64, text: String },
}

/// Vertical offset of an overlay's label below its first point.
pub const OVERLAY_LABEL_OFFSET: f64 = 10.0;
