pub mod normalize;
pub mod timestamp;

// Re-export the record types for convenient access (e.g. `use crate::series::Candle`).
pub use normalize::{Candle, ChartData, Transaction};
