// =============================================================================
// Rendering engine boundary
// =============================================================================
//
// The chart session never talks to a concrete renderer. It drives any engine
// that can register indicator templates, take a candle series, and add/remove
// indicators on a pane. `IndicatorPipeline` is the in-process engine used by
// the HTTP surface: it keeps the active indicator set and their results, and
// runs the draw step for whatever window a client is looking at.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::ChartError;
use crate::indicators::{Figure, IndicatorResult};
use crate::render::{CoordinateAxis, DrawContext, DrawOutput};
use crate::series::Candle;

/// Pane holding the main candle series.
pub const CANDLE_PANE: &str = "candle_pane";

/// A registered indicator: a pure `calc` over the candle series and a `draw`
/// callback the engine invokes once per repaint.
pub trait IndicatorTemplate: Send + Sync {
    fn name(&self) -> &'static str;

    fn figures(&self) -> Vec<Figure>;

    fn calc(&self, candles: &[Candle]) -> IndicatorResult;

    fn draw(&self, ctx: &DrawContext<'_>) -> DrawOutput;
}

/// Capability set the session needs from a rendering engine.
pub trait ChartEngine {
    fn register_indicator(&mut self, template: Arc<dyn IndicatorTemplate>);

    /// Replace the candle series. Active indicators are recomputed in full.
    fn apply_new_data(&mut self, candles: Vec<Candle>);

    /// Add `name` to `pane_id`. Adding an indicator that is already on the pane
    /// is a no-op.
    fn create_indicator(&mut self, name: &str, pane_id: &str) -> Result<(), ChartError>;

    /// Remove `name` from `pane_id`, returning whether it was present.
    fn remove_indicator(&mut self, pane_id: &str, name: &str) -> bool;

    /// Names of the indicators on `pane_id`, in creation order.
    fn active_indicators(&self, pane_id: &str) -> Vec<String>;
}

// =============================================================================
// IndicatorPipeline
// =============================================================================

struct ActiveIndicator {
    template: Arc<dyn IndicatorTemplate>,
    result: IndicatorResult,
}

/// Snapshot of one active indicator, for API consumers.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorView {
    pub name: String,
    pub pane: String,
    pub figures: Vec<Figure>,
    pub result: IndicatorResult,
}

/// Draw output of one indicator for a given window.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorDraw {
    pub name: String,
    #[serde(flatten)]
    pub output: DrawOutput,
}

/// In-process engine that keeps indicator results ready for repaint.
#[derive(Default)]
pub struct IndicatorPipeline {
    registry: HashMap<String, Arc<dyn IndicatorTemplate>>,
    candles: Vec<Candle>,
    panes: Vec<(String, Vec<ActiveIndicator>)>,
}

impl IndicatorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    fn pane_mut(&mut self, pane_id: &str) -> &mut Vec<ActiveIndicator> {
        let index = match self.panes.iter().position(|(id, _)| id == pane_id) {
            Some(i) => i,
            None => {
                self.panes.push((pane_id.to_string(), Vec::new()));
                self.panes.len() - 1
            }
        };
        &mut self.panes[index].1
    }

    /// Current results of every active indicator across all panes.
    pub fn views(&self) -> Vec<IndicatorView> {
        self.panes
            .iter()
            .flat_map(|(pane, active)| {
                active.iter().map(move |a| IndicatorView {
                    name: a.template.name().to_string(),
                    pane: pane.clone(),
                    figures: a.template.figures(),
                    result: a.result.clone(),
                })
            })
            .collect()
    }

    /// Run the draw step of every indicator on `pane_id` for `visible_range`.
    pub fn draw(
        &self,
        pane_id: &str,
        visible_range: Range<usize>,
        x_axis: &dyn CoordinateAxis,
        y_axis: &dyn CoordinateAxis,
    ) -> Vec<IndicatorDraw> {
        let Some((_, active)) = self.panes.iter().find(|(id, _)| id == pane_id) else {
            return Vec::new();
        };

        active
            .iter()
            .map(|a| {
                let ctx = DrawContext {
                    visible_range: visible_range.clone(),
                    x_axis,
                    y_axis,
                    result: &a.result,
                };
                IndicatorDraw {
                    name: a.template.name().to_string(),
                    output: a.template.draw(&ctx),
                }
            })
            .collect()
    }
}

impl ChartEngine for IndicatorPipeline {
    fn register_indicator(&mut self, template: Arc<dyn IndicatorTemplate>) {
        debug!(indicator = template.name(), "indicator registered");
        self.registry.insert(template.name().to_string(), template);
    }

    fn apply_new_data(&mut self, candles: Vec<Candle>) {
        info!(candles = candles.len(), "candle series applied");
        self.candles = candles;
        let candles = &self.candles;
        for (_, active) in &mut self.panes {
            for a in active.iter_mut() {
                a.result = a.template.calc(candles);
            }
        }
    }

    fn create_indicator(&mut self, name: &str, pane_id: &str) -> Result<(), ChartError> {
        let template = self
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| ChartError::UnknownIndicator(name.to_string()))?;

        let result = template.calc(&self.candles);
        let pane = self.pane_mut(pane_id);
        if pane.iter().any(|a| a.template.name() == name) {
            return Ok(());
        }
        pane.push(ActiveIndicator { template, result });
        debug!(indicator = %name, pane = %pane_id, "indicator created");
        Ok(())
    }

    fn remove_indicator(&mut self, pane_id: &str, name: &str) -> bool {
        let Some((_, active)) = self.panes.iter_mut().find(|(id, _)| id == pane_id) else {
            return false;
        };
        let before = active.len();
        active.retain(|a| a.template.name() != name);
        let removed = active.len() != before;
        if removed {
            debug!(indicator = %name, pane = %pane_id, "indicator removed");
        }
        removed
    }

    fn active_indicators(&self, pane_id: &str) -> Vec<String> {
        self.panes
            .iter()
            .find(|(id, _)| id == pane_id)
            .map(|(_, active)| {
                active
                    .iter()
                    .map(|a| a.template.name().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}
