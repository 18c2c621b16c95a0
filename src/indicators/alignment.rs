// =============================================================================
// Timeline alignment
// =============================================================================
//
// Transactions carry epoch seconds, candles carry epoch milliseconds. A
// transaction belongs to a candle only when `seconds * 1000` equals the
// candle timestamp exactly. No nearest-neighbour or window matching is done,
// so both sources must share the same sampling granularity.

use crate::series::{Candle, Transaction};

/// Milliseconds per transaction timestamp unit.
pub const TRANSACTION_UNIT_MS: i64 = 1000;

/// Return the first transaction (in source order) whose scaled timestamp equals
/// `candle.timestamp`, or `None` when nothing lines up.
pub fn align<'a>(candle: &Candle, transactions: &'a [Transaction]) -> Option<&'a Transaction> {
    transactions
        .iter()
        .find(|tx| tx.timestamp.checked_mul(TRANSACTION_UNIT_MS) == Some(candle.timestamp))
}

/// Number of transactions that no candle in `candles` picks up.
pub fn unmatched_count(candles: &[Candle], transactions: &[Transaction]) -> usize {
    transactions
        .iter()
        .filter(|tx| {
            let scaled = tx.timestamp.checked_mul(TRANSACTION_UNIT_MS);
            candles
                .binary_search_by_key(&scaled, |c| Some(c.timestamp))
                .is_err()
        })
        .count()
}
