// =============================================================================
// Overlays — user-placed chart decorations
// =============================================================================
//
// An overlay collects anchor points one click at a time. Until it has all the
// points its kind needs it is inert: nothing is resolved and nothing is drawn.
// Once complete its annotation is computed exactly once and never changes.

pub mod measure;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::render::{Coordinate, OverlayFigure, OVERLAY_LABEL_OFFSET};

pub use measure::{resolve_overlay, OverlayAnchor, OverlayAnnotation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    /// Box between two points labelled with value delta and elapsed time.
    Measure,
    /// Horizontal line at one point's value.
    PriceLine,
}

impl OverlayKind {
    /// Anchor points needed before the overlay is complete.
    pub fn required_points(self) -> usize {
        match self {
            Self::Measure => 2,
            Self::PriceLine => 1,
        }
    }
}

impl std::fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Measure => write!(f, "measure"),
            Self::PriceLine => write!(f, "price_line"),
        }
    }
}

/// Resolution state of an overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OverlayState {
    Incomplete,
    Measured(OverlayAnnotation),
    PriceTagged { label: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct Overlay {
    pub id: Uuid,
    pub kind: OverlayKind,
    pub points: Vec<OverlayAnchor>,
    #[serde(flatten)]
    pub state: OverlayState,
}

impl Overlay {
    pub fn new(kind: OverlayKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            points: Vec::with_capacity(kind.required_points()),
            state: OverlayState::Incomplete,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() >= self.kind.required_points()
    }

    /// Add the next anchor. Anchors beyond the required count are ignored.
    /// Returns `true` when this anchor completed the overlay.
    pub fn place_anchor(&mut self, anchor: OverlayAnchor, price_precision: usize) -> bool {
        if self.is_complete() {
            return false;
        }
        self.points.push(anchor);
        if !self.is_complete() {
            return false;
        }

        self.state = match self.kind {
            OverlayKind::Measure => {
                OverlayState::Measured(resolve_overlay(&self.points[0], &self.points[1]))
            }
            OverlayKind::PriceLine => OverlayState::PriceTagged {
                label: format!("{:.*}", price_precision, self.points[0].value),
            },
        };
        true
    }

    /// Figures for this overlay given its points already mapped to pixels.
    /// Incomplete overlays, or a coordinate count that does not match the
    /// points, produce nothing.
    pub fn point_figures(&self, coordinates: &[Coordinate]) -> Vec<OverlayFigure> {
        if coordinates.len() != self.kind.required_points() {
            return Vec::new();
        }

        match &self.state {
            OverlayState::Incomplete => Vec::new(),
            OverlayState::Measured(annotation) => {
                let (a, b) = (coordinates[0], coordinates[1]);
                vec![
                    OverlayFigure::Rect {
                        x: a.x,
                        y: a.y,
                        width: b.x - a.x,
                        height: b.y - a.y,
                    },
                    OverlayFigure::Text {
                        x: a.x,
                        y: a.y + OVERLAY_LABEL_OFFSET,
                        text: annotation.label(),
                    },
                ]
            }
            OverlayState::PriceTagged { label } => {
                let a = coordinates[0];
                vec![
                    OverlayFigure::HorizontalLine { y: a.y },
                    OverlayFigure::Text {
                        x: a.x,
                        y: a.y,
                        text: label.clone(),
                    },
                ]
            }
        }
    }
}
