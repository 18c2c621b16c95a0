// =============================================================================
// Shared types used across the profit chart engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Side of a recorded trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeMode {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Which shape the primary (candle) source is delivered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    /// `[{time, profit, price, average_price}]` written by the backtester.
    ProfitFlow,
    /// `{ "<datetime>": {open, high, low, close} }` price history.
    PriceHistory,
}

impl Default for SeriesKind {
    fn default() -> Self {
        Self::ProfitFlow
    }
}

impl std::fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProfitFlow => write!(f, "profit_flow"),
            Self::PriceHistory => write!(f, "price_history"),
        }
    }
}

/// Presence of the reference ("zero") line on the candle pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceLineState {
    Absent,
    Present,
}

impl Default for ReferenceLineState {
    fn default() -> Self {
        Self::Absent
    }
}

impl std::fmt::Display for ReferenceLineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => write!(f, "ABSENT"),
            Self::Present => write!(f, "PRESENT"),
        }
    }
}
