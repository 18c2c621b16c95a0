// =============================================================================
// Runtime Configuration — chart service settings with atomic save
// =============================================================================
//
// Where the two series come from, how their timestamps are read, and how the
// annotations are styled. All fields carry `#[serde(default)]` so that adding
// new fields never breaks loading an older config file.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::render::MarkerStyle;
use crate::session::SessionOptions;
use crate::types::SeriesKind;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_profit_source() -> String {
    "results/grid_trading/profit_flow.json".to_string()
}

fn default_transaction_source() -> String {
    "results/grid_trading/result.json".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:9898".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_utc_offset_hours() -> i32 {
    8
}

fn default_roi_capital() -> f64 {
    182.0
}

fn default_price_precision() -> usize {
    4
}

fn default_buy_color() -> String {
    "#FF007F".to_string()
}

fn default_sell_color() -> String {
    "#90EE90".to_string()
}

fn default_marker_radius() -> f64 {
    4.0
}

fn default_line_color() -> String {
    "#FF4500".to_string()
}

fn default_dash_pattern() -> Vec<u32> {
    vec![8, 4]
}

fn default_line_size() -> f64 {
    1.0
}

// =============================================================================
// ReferenceLineStyle
// =============================================================================

/// How the engine should stroke the reference line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLineStyle {
    #[serde(default = "default_line_color")]
    pub color: String,

    /// Dash and gap lengths in pixels.
    #[serde(default = "default_dash_pattern")]
    pub dashed_value: Vec<u32>,

    #[serde(default = "default_line_size")]
    pub size: f64,
}

impl Default for ReferenceLineStyle {
    fn default() -> Self {
        Self {
            color: default_line_color(),
            dashed_value: default_dash_pattern(),
            size: default_line_size(),
        }
    }
}

// =============================================================================
// ChartConfig
// =============================================================================

/// Top-level configuration for the chart service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    // --- Sources ------------------------------------------------------------

    /// Primary series: an `http(s)://` URL or a filesystem path.
    #[serde(default = "default_profit_source")]
    pub profit_source: String,

    /// Transaction log: an `http(s)://` URL or a filesystem path.
    #[serde(default = "default_transaction_source")]
    pub transaction_source: String,

    /// Shape of the primary series.
    #[serde(default)]
    pub series: SeriesKind,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    // --- Server -------------------------------------------------------------

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // --- Normalisation ------------------------------------------------------

    /// Offset (hours east of UTC) that naive datetime strings are written in.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// Starting budget the ROI percentage is measured against.
    #[serde(default = "default_roi_capital")]
    pub roi_capital: f64,

    // --- Presentation -------------------------------------------------------

    #[serde(default = "default_price_precision")]
    pub price_precision: usize,

    /// Value the reference line is drawn at.
    #[serde(default)]
    pub reference_value: f64,

    #[serde(default = "default_buy_color")]
    pub buy_color: String,

    #[serde(default = "default_sell_color")]
    pub sell_color: String,

    #[serde(default = "default_marker_radius")]
    pub marker_radius: f64,

    #[serde(default)]
    pub reference_line_style: ReferenceLineStyle,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            profit_source: default_profit_source(),
            transaction_source: default_transaction_source(),
            series: SeriesKind::default(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            bind_addr: default_bind_addr(),
            utc_offset_hours: default_utc_offset_hours(),
            roi_capital: default_roi_capital(),
            price_precision: default_price_precision(),
            reference_value: 0.0,
            buy_color: default_buy_color(),
            sell_color: default_sell_color(),
            marker_radius: default_marker_radius(),
            reference_line_style: ReferenceLineStyle::default(),
        }
    }
}

impl ChartConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read chart config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse chart config from {}", path.display()))?;

        info!(
            path = %path.display(),
            series = %config.series,
            profit_source = %config.profit_source,
            transaction_source = %config.transaction_source,
            "chart config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise chart config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "chart config saved (atomic)");
        Ok(())
    }

    /// Apply `CHART_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("CHART_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Ok(src) = std::env::var("CHART_PROFIT_SOURCE") {
            self.profit_source = src;
        }
        if let Ok(src) = std::env::var("CHART_TRANSACTION_SOURCE") {
            self.transaction_source = src;
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            reference_value: self.reference_value,
            price_precision: self.price_precision,
            markers: MarkerStyle {
                buy_color: self.buy_color.clone(),
                sell_color: self.sell_color.clone(),
                radius: self.marker_radius,
            },
        }
    }
}
