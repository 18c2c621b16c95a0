// =============================================================================
// Chart Indicators Module
// =============================================================================
//
// Per-candle derived values bound to the candle series. Every builder is a
// pure function of its inputs and returns exactly one slot per candle so the
// renderer can index results by candle position.

pub mod alignment;
pub mod reference_line;
pub mod transaction;

use serde::Serialize;

pub use reference_line::{ReferenceLineIndicator, REFERENCE_LINE};
pub use transaction::{TransactionAnnotation, TransactionIndicator, TRANSACTION};

/// Output of an indicator's `calc` step, one entry per candle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum IndicatorResult {
    /// Trade annotation per candle; `None` where no transaction aligned.
    Transactions(Vec<Option<TransactionAnnotation>>),
    /// Constant reference value per candle.
    Reference(Vec<f64>),
}

impl IndicatorResult {
    pub fn len(&self) -> usize {
        match self {
            Self::Transactions(slots) => slots.len(),
            Self::Reference(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How the engine should present an indicator's figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureKind {
    /// Drawn entirely by the indicator's own `draw` step.
    Custom,
    /// A polyline the engine draws from the result values.
    Line,
}

/// A named output of an indicator, as advertised to the engine's tooltip and
/// default-figure machinery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub key: &'static str,
    pub title: &'static str,
    pub kind: FigureKind,
}
