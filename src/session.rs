// =============================================================================
// Chart Session — per-chart interaction state
// =============================================================================
//
// Binds the normalised series to an engine once, then handles the discrete UI
// events: toggling the reference line and placing overlay anchors. The session
// owns the reference-line presence and the overlay list; nothing else mutates
// them.
// =============================================================================

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::{ChartEngine, CANDLE_PANE};
use crate::error::ChartError;
use crate::indicators::alignment::unmatched_count;
use crate::indicators::{ReferenceLineIndicator, TransactionIndicator, REFERENCE_LINE, TRANSACTION};
use crate::overlay::{Overlay, OverlayAnchor, OverlayKind};
use crate::render::MarkerStyle;
use crate::series::ChartData;
use crate::types::ReferenceLineState;

/// Settings the session needs from the runtime configuration.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub reference_value: f64,
    pub price_precision: usize,
    pub markers: MarkerStyle,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            reference_value: 0.0,
            price_precision: 4,
            markers: MarkerStyle::default(),
        }
    }
}

pub struct ChartSession<E: ChartEngine> {
    engine: E,
    options: SessionOptions,
    reference_line: ReferenceLineState,
    overlays: Vec<Overlay>,
    /// Index into `overlays` of the overlay currently being drawn.
    drawing: Option<usize>,
}

impl<E: ChartEngine> ChartSession<E> {
    /// Register the indicators, hand the candles to `engine`, and show the
    /// transaction markers on the candle pane.
    pub fn new(mut engine: E, data: ChartData, options: SessionOptions) -> Result<Self, ChartError> {
        let unmatched = unmatched_count(&data.candles, &data.transactions);
        if unmatched > 0 {
            warn!(
                unmatched,
                total = data.transactions.len(),
                "transactions with no candle at the same timestamp will not be drawn"
            );
        }

        let transactions = Arc::new(data.transactions);
        engine.register_indicator(Arc::new(TransactionIndicator::new(
            transactions,
            options.markers.clone(),
        )));
        engine.register_indicator(Arc::new(ReferenceLineIndicator::new(
            options.reference_value,
        )));
        engine.apply_new_data(data.candles);
        engine.create_indicator(TRANSACTION, CANDLE_PANE)?;

        info!("chart session ready");
        Ok(Self {
            engine,
            options,
            reference_line: ReferenceLineState::Absent,
            overlays: Vec::new(),
            drawing: None,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn reference_line(&self) -> ReferenceLineState {
        self.reference_line
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// The overlay currently collecting anchors, if any.
    pub fn drawing(&self) -> Option<&Overlay> {
        self.drawing.map(|i| &self.overlays[i])
    }

    /// Flip the reference line between ABSENT and PRESENT.
    pub fn toggle_reference_line(&mut self) -> Result<ReferenceLineState, ChartError> {
        self.reference_line = match self.reference_line {
            ReferenceLineState::Absent => {
                self.engine.create_indicator(REFERENCE_LINE, CANDLE_PANE)?;
                ReferenceLineState::Present
            }
            ReferenceLineState::Present => {
                self.engine.remove_indicator(CANDLE_PANE, REFERENCE_LINE);
                ReferenceLineState::Absent
            }
        };
        info!(state = %self.reference_line, "reference line toggled");
        Ok(self.reference_line)
    }

    /// Start drawing a new overlay. An overlay still missing anchors is
    /// abandoned in favour of the new one.
    pub fn create_overlay(&mut self, kind: OverlayKind) -> Uuid {
        if let Some(i) = self.drawing.take() {
            let abandoned = self.overlays.remove(i);
            debug!(id = %abandoned.id, kind = %abandoned.kind, "incomplete overlay abandoned");
        }

        let overlay = Overlay::new(kind);
        let id = overlay.id;
        self.overlays.push(overlay);
        self.drawing = Some(self.overlays.len() - 1);
        debug!(id = %id, kind = %kind, "overlay started");
        id
    }

    /// Place the next anchor of the overlay being drawn.
    pub fn place_overlay_anchor(&mut self, anchor: OverlayAnchor) -> Result<&Overlay, ChartError> {
        let index = self.drawing.ok_or(ChartError::NoOverlayInProgress)?;
        let overlay = &mut self.overlays[index];

        if overlay.place_anchor(anchor, self.options.price_precision) {
            info!(id = %overlay.id, kind = %overlay.kind, "overlay completed");
            self.drawing = None;
        }
        Ok(&self.overlays[index])
    }

    /// Remove every overlay, including one being drawn.
    pub fn clear_overlays(&mut self) {
        self.overlays.clear();
        self.drawing = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::IndicatorPipeline;
    use crate::indicators::IndicatorResult;
    use crate::overlay::OverlayState;
    use crate::series::{Candle, Transaction};
    use crate::types::TradeMode;

    fn data() -> ChartData {
        ChartData {
            candles: (1..=3)
                .map(|i| Candle {
                    timestamp: i * 1000,
                    open: 0.0,
                    high: 0.0,
                    low: 0.0,
                    close: i as f64,
                })
                .collect(),
            transactions: vec![Transaction {
                timestamp: 2,
                mode: TradeMode::Sell,
                price: 5.0,
                amount: 0.5,
            }],
        }
    }

    fn session() -> ChartSession<IndicatorPipeline> {
        ChartSession::new(IndicatorPipeline::new(), data(), SessionOptions::default()).unwrap()
    }

    #[test]
    fn transaction_indicator_is_active_on_start() {
        let s = session();
        assert_eq!(s.engine().active_indicators(CANDLE_PANE), vec![TRANSACTION]);
        assert_eq!(s.reference_line(), ReferenceLineState::Absent);

        let views = s.engine().views();
        let IndicatorResult::Transactions(slots) = &views[0].result else {
            panic!("unexpected result shape");
        };
        assert_eq!(slots.len(), 3);
        assert!(slots[0].is_none());
        assert_eq!(slots[1].unwrap().current_price, 2.0);
        assert!(slots[2].is_none());
    }

    #[test]
    fn toggling_twice_restores_indicator_set() {
        let mut s = session();
        let before = s.engine().active_indicators(CANDLE_PANE);

        assert_eq!(s.toggle_reference_line().unwrap(), ReferenceLineState::Present);
        assert_eq!(
            s.engine().active_indicators(CANDLE_PANE),
            vec![TRANSACTION, REFERENCE_LINE]
        );

        assert_eq!(s.toggle_reference_line().unwrap(), ReferenceLineState::Absent);
        assert_eq!(s.engine().active_indicators(CANDLE_PANE), before);
    }

    #[test]
    fn anchor_without_overlay_is_rejected() {
        let mut s = session();
        let err = s
            .place_overlay_anchor(OverlayAnchor {
                value: 1.0,
                timestamp: 0,
            })
            .unwrap_err();
        assert!(matches!(err, ChartError::NoOverlayInProgress));
    }

    #[test]
    fn measurement_flow() {
        let mut s = session();
        let id = s.create_overlay(OverlayKind::Measure);
        assert_eq!(s.drawing().map(|o| o.id), Some(id));

        let first = s
            .place_overlay_anchor(OverlayAnchor {
                value: 1.0,
                timestamp: 0,
            })
            .unwrap();
        assert_eq!(first.state, OverlayState::Incomplete);

        let done = s
            .place_overlay_anchor(OverlayAnchor {
                value: 0.5,
                timestamp: 61 * 60_000,
            })
            .unwrap();
        match &done.state {
            OverlayState::Measured(a) => assert_eq!(a.label(), "-0.50, 1hr 1min"),
            other => panic!("unexpected state {other:?}"),
        }
        assert!(s.drawing().is_none());
        assert_eq!(s.overlays().len(), 1);
    }

    #[test]
    fn new_overlay_abandons_incomplete_one() {
        let mut s = session();
        s.create_overlay(OverlayKind::Measure);
        s.place_overlay_anchor(OverlayAnchor {
            value: 1.0,
            timestamp: 0,
        })
        .unwrap();

        let id = s.create_overlay(OverlayKind::PriceLine);
        assert_eq!(s.overlays().len(), 1);
        assert_eq!(s.overlays()[0].id, id);
    }

    #[test]
    fn overlays_are_independent() {
        let mut s = session();
        for value in [1.0, 2.0] {
            s.create_overlay(OverlayKind::PriceLine);
            s.place_overlay_anchor(OverlayAnchor {
                value,
                timestamp: 0,
            })
            .unwrap();
        }
        let labels: Vec<_> = s.overlays().iter().map(|o| o.state.clone()).collect();
        assert_eq!(
            labels,
            vec![
                OverlayState::PriceTagged {
                    label: "1.0000".into()
                },
                OverlayState::PriceTagged {
                    label: "2.0000".into()
                },
            ]
        );

        s.clear_overlays();
        assert!(s.overlays().is_empty());
    }
}
