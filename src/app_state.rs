// =============================================================================
// Central Application State — chart service
// =============================================================================
//
// Ties the loaded chart session to the HTTP and WebSocket surfaces and provides
// a unified snapshot for both.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock around the session; every UI event is a short write.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::engine::{ChartEngine, IndicatorPipeline, CANDLE_PANE};
use crate::overlay::Overlay;
use crate::runtime_config::{ChartConfig, ReferenceLineStyle};
use crate::session::ChartSession;
use crate::types::{ReferenceLineState, SeriesKind};

pub type Session = ChartSession<IndicatorPipeline>;

/// Shared across all handlers via `Arc<AppState>`.
pub struct AppState {
    /// Incremented on every session mutation. The WebSocket feed compares it
    /// against the last version it pushed.
    pub state_version: AtomicU64,

    pub config: ChartConfig,

    pub session: RwLock<Session>,

    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: ChartConfig, session: Session) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            config,
            session: RwLock::new(session),
            start_time: std::time::Instant::now(),
        }
    }

    /// Bump the state version, returning the new value.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    /// Point-in-time view of the chart for API consumers.
    pub fn build_snapshot(&self) -> SessionSnapshot {
        let session = self.session.read();
        SessionSnapshot {
            state_version: self.current_state_version(),
            server_time: Utc::now().timestamp_millis(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            series: self.config.series,
            candle_count: session.engine().candles().len(),
            reference_line: session.reference_line(),
            reference_line_style: self.config.reference_line_style.clone(),
            indicators: session.engine().active_indicators(CANDLE_PANE),
            overlays: session.overlays().to_vec(),
            drawing: session.drawing().map(|o| o.id),
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state_version: u64,
    /// Epoch milliseconds.
    pub server_time: i64,
    pub uptime_secs: u64,
    pub series: SeriesKind,
    pub candle_count: usize,
    pub reference_line: ReferenceLineState,
    pub reference_line_style: ReferenceLineStyle,
    /// Active indicators on the candle pane, in creation order.
    pub indicators: Vec<String>,
    pub overlays: Vec<Overlay>,
    /// Id of the overlay still collecting anchors.
    pub drawing: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::TRANSACTION;
    use crate::overlay::OverlayKind;
    use crate::series::{Candle, ChartData};

    fn state() -> AppState {
        let config = ChartConfig::default();
        let data = ChartData {
            candles: vec![Candle {
                timestamp: 60_000,
                open: 0.0,
                high: 1.0,
                low: 0.0,
                close: 0.5,
            }],
            transactions: Vec::new(),
        };
        let session =
            ChartSession::new(IndicatorPipeline::new(), data, config.session_options()).unwrap();
        AppState::new(config, session)
    }

    #[test]
    fn version_increments_monotonically() {
        let s = state();
        let v0 = s.current_state_version();
        assert_eq!(s.increment_version(), v0 + 1);
        assert_eq!(s.increment_version(), v0 + 2);
        assert_eq!(s.current_state_version(), v0 + 2);
    }

    #[test]
    fn snapshot_reflects_session() {
        let s = state();
        let snap = s.build_snapshot();
        assert_eq!(snap.candle_count, 1);
        assert_eq!(snap.indicators, vec![TRANSACTION]);
        assert_eq!(snap.reference_line, ReferenceLineState::Absent);
        assert!(snap.drawing.is_none());

        let id = s.session.write().create_overlay(OverlayKind::Measure);
        let snap = s.build_snapshot();
        assert_eq!(snap.drawing, Some(id));
        assert_eq!(snap.overlays.len(), 1);
    }
}
