// =============================================================================
// Chart engine errors
// =============================================================================
//
// Data loading is the only fatal failure. Alignment misses and incomplete
// overlays are ordinary states and never appear here; the remaining variants
// reject a single request without touching the chart.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    /// A source could not be fetched or its body could not be normalised.
    /// Fatal to initialisation; the chart is never built from partial data.
    #[error("data source '{source_name}' unavailable: {reason}")]
    DataUnavailable { source_name: String, reason: String },

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("no overlay is being drawn")]
    NoOverlayInProgress,

    #[error("indicator '{0}' is not registered")]
    UnknownIndicator(String),
}

impl ChartError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::DataUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}
