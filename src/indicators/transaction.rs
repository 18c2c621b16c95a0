// =============================================================================
// Transaction markers
// =============================================================================
//
// Attaches each recorded trade to the candle it happened on and draws a
// coloured dot at that candle's close. Candles without a trade keep an explicit
// empty slot so the result always lines up index-for-index with the series.

use std::sync::Arc;

use serde::Serialize;

use crate::engine::IndicatorTemplate;
use crate::indicators::alignment::align;
use crate::indicators::{Figure, FigureKind, IndicatorResult};
use crate::render::{DrawContext, DrawInstruction, DrawOutput, MarkerStyle};
use crate::series::{Candle, Transaction};
use crate::types::TradeMode;

/// Registered name of the transaction indicator.
pub const TRANSACTION: &str = "Transaction";

/// Trade details attached to a single candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransactionAnnotation {
    pub mode: TradeMode,
    pub buy_price: f64,
    pub amount: f64,
    /// Close of the candle the trade aligned to.
    pub current_price: f64,
}

/// Build one slot per candle, in candle order.
pub fn build_transaction_indicator(
    candles: &[Candle],
    transactions: &[Transaction],
) -> Vec<Option<TransactionAnnotation>> {
    candles
        .iter()
        .map(|candle| {
            align(candle, transactions).map(|tx| TransactionAnnotation {
                mode: tx.mode,
                buy_price: tx.price,
                amount: tx.amount,
                current_price: candle.close,
            })
        })
        .collect()
}

/// Indicator template carrying the transaction log it aligns against.
pub struct TransactionIndicator {
    transactions: Arc<Vec<Transaction>>,
    style: MarkerStyle,
}

impl TransactionIndicator {
    pub fn new(transactions: Arc<Vec<Transaction>>, style: MarkerStyle) -> Self {
        Self {
            transactions,
            style,
        }
    }

    fn color_for(&self, mode: TradeMode) -> &str {
        match mode {
            TradeMode::Buy => self.style.buy_color.as_str(),
            TradeMode::Sell => self.style.sell_color.as_str(),
        }
    }
}

impl IndicatorTemplate for TransactionIndicator {
    fn name(&self) -> &'static str {
        TRANSACTION
    }

    fn figures(&self) -> Vec<Figure> {
        vec![Figure {
            key: "transaction",
            title: "",
            kind: FigureKind::Custom,
        }]
    }

    fn calc(&self, candles: &[Candle]) -> IndicatorResult {
        IndicatorResult::Transactions(build_transaction_indicator(candles, &self.transactions))
    }

    fn draw(&self, ctx: &DrawContext<'_>) -> DrawOutput {
        let IndicatorResult::Transactions(slots) = ctx.result else {
            return DrawOutput::default();
        };

        let instructions = ctx
            .clamped_range()
            .filter_map(|i| {
                slots[i].as_ref().map(|annotation| DrawInstruction::Circle {
                    x: ctx.x_axis.convert_to_pixel(i as f64),
                    y: ctx.y_axis.convert_to_pixel(annotation.current_price),
                    radius: self.style.radius,
                    color: self.color_for(annotation.mode).to_string(),
                })
            })
            .collect();

        DrawOutput {
            instructions,
            default_figures: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CoordinateAxis, DataSpaceAxis};

    fn candle(timestamp: i64, close: f64) -> Candle {
        Candle {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
        }
    }

    fn tx(timestamp: i64, mode: TradeMode, price: f64, amount: f64) -> Transaction {
        Transaction {
            timestamp,
            mode,
            price,
            amount,
        }
    }

    struct Offset(f64);

    impl CoordinateAxis for Offset {
        fn convert_to_pixel(&self, value: f64) -> f64 {
            value + self.0
        }
    }

    #[test]
    fn single_candle_match() {
        let candles = vec![candle(1000, 12.5)];
        let txs = vec![tx(1, TradeMode::Buy, 10.0, 2.0)];
        let slots = build_transaction_indicator(&candles, &txs);
        assert_eq!(
            slots,
            vec![Some(TransactionAnnotation {
                mode: TradeMode::Buy,
                buy_price: 10.0,
                amount: 2.0,
                current_price: 12.5,
            })]
        );
    }

    #[test]
    fn single_candle_miss() {
        let candles = vec![candle(1000, 12.5)];
        let txs = vec![tx(2, TradeMode::Buy, 10.0, 2.0)];
        assert_eq!(build_transaction_indicator(&candles, &txs), vec![None]);
    }

    #[test]
    fn length_always_matches_candles() {
        let candles: Vec<Candle> = (0..50).map(|i| candle(i * 60_000, i as f64)).collect();
        let txs: Vec<Transaction> = (0..50)
            .step_by(7)
            .map(|i| tx(i * 60, TradeMode::Sell, 1.0, 1.0))
            .collect();
        let slots = build_transaction_indicator(&candles, &txs);
        assert_eq!(slots.len(), candles.len());
        assert_eq!(slots.iter().filter(|s| s.is_some()).count(), txs.len());
        assert!(build_transaction_indicator(&[], &txs).is_empty());
        assert_eq!(build_transaction_indicator(&candles, &[]).len(), 50);
    }

    #[test]
    fn draw_emits_markers_only_for_annotated_visible_slots() {
        let candles = vec![
            candle(60_000, 1.0),
            candle(120_000, 2.0),
            candle(180_000, 3.0),
            candle(240_000, 4.0),
        ];
        let txs = vec![
            tx(60, TradeMode::Buy, 1.0, 1.0),
            tx(180, TradeMode::Sell, 3.0, 1.0),
            tx(240, TradeMode::Buy, 4.0, 1.0),
        ];
        let indicator = TransactionIndicator::new(Arc::new(txs), MarkerStyle::default());
        let result = indicator.calc(&candles);

        let ctx = DrawContext {
            visible_range: 1..3,
            x_axis: &Offset(100.0),
            y_axis: &DataSpaceAxis,
            result: &result,
        };
        let output = indicator.draw(&ctx);
        assert!(!output.default_figures);
        assert_eq!(
            output.instructions,
            vec![DrawInstruction::Circle {
                x: 102.0,
                y: 3.0,
                radius: 4.0,
                color: "#90EE90".to_string(),
            }]
        );
    }

    #[test]
    fn draw_colours_by_mode() {
        let candles = vec![candle(60_000, 1.0), candle(120_000, 2.0)];
        let txs = vec![
            tx(60, TradeMode::Buy, 1.0, 1.0),
            tx(120, TradeMode::Sell, 2.0, 1.0),
        ];
        let indicator = TransactionIndicator::new(Arc::new(txs), MarkerStyle::default());
        let result = indicator.calc(&candles);
        let ctx = DrawContext {
            visible_range: 0..2,
            x_axis: &DataSpaceAxis,
            y_axis: &DataSpaceAxis,
            result: &result,
        };
        let colors: Vec<String> = indicator
            .draw(&ctx)
            .instructions
            .into_iter()
            .map(|DrawInstruction::Circle { color, .. }| color)
            .collect();
        assert_eq!(colors, vec!["#FF007F", "#90EE90"]);
    }

    #[test]
    fn draw_ignores_foreign_result_shape() {
        let indicator = TransactionIndicator::new(Arc::new(Vec::new()), MarkerStyle::default());
        let result = IndicatorResult::Reference(vec![0.0; 4]);
        let ctx = DrawContext {
            visible_range: 0..4,
            x_axis: &DataSpaceAxis,
            y_axis: &DataSpaceAxis,
            result: &result,
        };
        assert!(indicator.draw(&ctx).instructions.is_empty());
    }
}
