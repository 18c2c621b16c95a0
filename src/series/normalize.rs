use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ChartError;
use crate::series::timestamp::{to_millis, RawTime};
use crate::types::TradeMode;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// One time bucket of the primary series. `timestamp` is epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// A recorded trade. `timestamp` stays in epoch **seconds**, as written by the
/// backtester; alignment scales it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub timestamp: i64,
    pub mode: TradeMode,
    pub price: f64,
    pub amount: f64,
}

/// A fully normalised pair of series, ready to be bound to a chart.
#[derive(Debug, Clone, Default)]
pub struct ChartData {
    pub candles: Vec<Candle>,
    pub transactions: Vec<Transaction>,
}

// ---------------------------------------------------------------------------
// Raw wire records
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProfitRecord {
    time: RawTime,
    profit: f64,
    price: f64,
    average_price: f64,
}

#[derive(Debug, Deserialize)]
struct PriceBar {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

#[derive(Debug, Deserialize)]
struct TransactionRecord {
    timestamp: i64,
    #[serde(default)]
    transaction: Option<TradeFields>,
}

#[derive(Debug, Deserialize)]
struct TradeFields {
    mode: TradeMode,
    price: f64,
    amount: f64,
}

// ---------------------------------------------------------------------------
// Normalisers
// ---------------------------------------------------------------------------

/// Normalise a profit-flow body into candles.
///
/// Mapping: `close = profit`, `high = price`, `open = average_price`, and
/// `low` carries the ROI percentage `100 * profit / roi_capital` (zero when
/// `roi_capital` is not positive).
pub fn parse_profit_flow(
    source_name: &str,
    body: &str,
    offset: FixedOffset,
    roi_capital: f64,
) -> Result<Vec<Candle>, ChartError> {
    let records: Vec<ProfitRecord> =
        serde_json::from_str(body).map_err(|e| ChartError::unavailable(source_name, e))?;

    let mut candles = Vec::with_capacity(records.len());
    for record in records {
        let timestamp =
            to_millis(&record.time, offset).map_err(|e| ChartError::unavailable(source_name, e))?;
        let roi = if roi_capital > 0.0 {
            100.0 * record.profit / roi_capital
        } else {
            0.0
        };
        candles.push(Candle {
            timestamp,
            open: record.average_price,
            high: record.price,
            low: roi,
            close: record.profit,
        });
    }

    ensure_strictly_increasing(source_name, &candles)?;
    debug!(source = %source_name, candles = candles.len(), "profit flow normalised");
    Ok(candles)
}

/// Normalise a price-history body (an object keyed by datetime) into candles
/// ordered by timestamp.
pub fn parse_price_history(
    source_name: &str,
    body: &str,
    offset: FixedOffset,
) -> Result<Vec<Candle>, ChartError> {
    let bars: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(body).map_err(|e| ChartError::unavailable(source_name, e))?;

    let mut candles = Vec::with_capacity(bars.len());
    for (key, value) in bars {
        let bar: PriceBar =
            serde_json::from_value(value).map_err(|e| ChartError::unavailable(source_name, e))?;
        let timestamp = to_millis(&RawTime::Text(key), offset)
            .map_err(|e| ChartError::unavailable(source_name, e))?;
        candles.push(Candle {
            timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
        });
    }
    candles.sort_by_key(|c| c.timestamp);

    ensure_strictly_increasing(source_name, &candles)?;
    debug!(source = %source_name, candles = candles.len(), "price history normalised");
    Ok(candles)
}

/// Normalise a transaction log body.
///
/// The log ends with a closing snapshot that carries no `transaction` field;
/// it is dropped. A missing `transaction` anywhere else is malformed input.
pub fn parse_transactions(source_name: &str, body: &str) -> Result<Vec<Transaction>, ChartError> {
    let mut records: Vec<TransactionRecord> =
        serde_json::from_str(body).map_err(|e| ChartError::unavailable(source_name, e))?;

    if records.last().is_some_and(|r| r.transaction.is_none()) {
        records.pop();
    }

    let mut transactions = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let fields = record.transaction.ok_or_else(|| {
            ChartError::unavailable(source_name, format!("record {index} has no transaction"))
        })?;
        transactions.push(Transaction {
            timestamp: record.timestamp,
            mode: fields.mode,
            price: fields.price,
            amount: fields.amount,
        });
    }

    debug!(source = %source_name, transactions = transactions.len(), "transaction log normalised");
    Ok(transactions)
}

fn ensure_strictly_increasing(source_name: &str, candles: &[Candle]) -> Result<(), ChartError> {
    match candles
        .windows(2)
        .position(|pair| pair[1].timestamp <= pair[0].timestamp)
    {
        Some(i) => Err(ChartError::unavailable(
            source_name,
            format!(
                "candle timestamps not strictly increasing at index {} ({} after {})",
                i + 1,
                candles[i + 1].timestamp,
                candles[i].timestamp
            ),
        )),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
