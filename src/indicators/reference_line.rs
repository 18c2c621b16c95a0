// =============================================================================
// Reference ("zero") line
// =============================================================================
//
// A constant value per candle. The engine draws it as a dashed line through
// its default line-figure machinery; the custom draw step paints nothing.

use crate::engine::IndicatorTemplate;
use crate::indicators::{Figure, FigureKind, IndicatorResult};
use crate::render::{DrawContext, DrawOutput};
use crate::series::Candle;

/// Registered name of the reference-line indicator.
pub const REFERENCE_LINE: &str = "ReferenceLine";

/// `value` repeated once per candle.
pub fn build_reference_line(candles: &[Candle], value: f64) -> Vec<f64> {
    vec![value; candles.len()]
}

pub struct ReferenceLineIndicator {
    value: f64,
}

impl ReferenceLineIndicator {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl IndicatorTemplate for ReferenceLineIndicator {
    fn name(&self) -> &'static str {
        REFERENCE_LINE
    }

    fn figures(&self) -> Vec<Figure> {
        vec![Figure {
            key: "reference",
            title: "Zero Line: ",
            kind: FigureKind::Line,
        }]
    }

    fn calc(&self, candles: &[Candle]) -> IndicatorResult {
        IndicatorResult::Reference(build_reference_line(candles, self.value))
    }

    fn draw(&self, _ctx: &DrawContext<'_>) -> DrawOutput {
        DrawOutput {
            instructions: Vec::new(),
            default_figures: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DataSpaceAxis;

    fn candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle {
                timestamp: i as i64,
                open: 5.0,
                high: 6.0,
                low: 4.0,
                close: 5.5,
            })
            .collect()
    }

    #[test]
    fn constant_per_candle() {
        assert_eq!(build_reference_line(&candles(3), 0.0), vec![0.0, 0.0, 0.0]);
        assert!(build_reference_line(&[], 0.0).is_empty());
    }

    #[test]
    fn draw_defers_to_default_line() {
        let indicator = ReferenceLineIndicator::new(0.0);
        let result = indicator.calc(&candles(10));
        assert_eq!(result.len(), 10);

        let ctx = DrawContext {
            visible_range: 0..10,
            x_axis: &DataSpaceAxis,
            y_axis: &DataSpaceAxis,
            result: &result,
        };
        let output = indicator.draw(&ctx);
        assert!(output.instructions.is_empty());
        assert!(output.default_figures);
        assert_eq!(indicator.figures()[0].kind, FigureKind::Line);
    }
}
