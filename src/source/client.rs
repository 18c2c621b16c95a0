// =============================================================================
// Series Client — loads and normalises both chart sources
// =============================================================================
//
// The primary series and the transaction log are fetched concurrently and the
// chart is only built once both have arrived and normalised cleanly. Any
// failure (transport, non-2xx status, malformed body) surfaces as
// `DataUnavailable` naming the source; there is no retry and no partial chart.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::error::ChartError;
use crate::runtime_config::ChartConfig;
use crate::series::normalize::{parse_price_history, parse_profit_flow, parse_transactions};
use crate::series::timestamp::utc_offset;
use crate::series::{Candle, ChartData, Transaction};
use crate::source::DataSource;
use crate::types::SeriesKind;

const PRIMARY: &str = "primary series";
const TRANSACTIONS: &str = "transaction log";

/// Reads series bodies over HTTP or from disk.
#[derive(Clone)]
pub struct DataClient {
    client: reqwest::Client,
}

impl DataClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        debug!(timeout_secs = timeout.as_secs(), "DataClient initialised");
        Ok(Self { client })
    }

    /// Read the raw body of `source`.
    #[instrument(skip(self), name = "source::fetch_body")]
    pub async fn fetch_body(&self, name: &str, source: &DataSource) -> Result<String, ChartError> {
        match source {
            DataSource::Http(url) => {
                let resp = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| ChartError::unavailable(name, e))?;

                let status = resp.status();
                if !status.is_success() {
                    return Err(ChartError::unavailable(name, format!("GET {url} returned {status}")));
                }

                resp.text().await.map_err(|e| ChartError::unavailable(name, e))
            }
            DataSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ChartError::unavailable(name, format!("{}: {e}", path.display()))),
        }
    }

    async fn fetch_candles(&self, config: &ChartConfig) -> Result<Vec<Candle>, ChartError> {
        let source = DataSource::parse(&config.profit_source);
        let body = self.fetch_body(PRIMARY, &source).await?;
        let offset = utc_offset(config.utc_offset_hours)
            .map_err(|e| ChartError::unavailable(PRIMARY, e))?;

        match config.series {
            SeriesKind::ProfitFlow => parse_profit_flow(PRIMARY, &body, offset, config.roi_capital),
            SeriesKind::PriceHistory => parse_price_history(PRIMARY, &body, offset),
        }
    }

    async fn fetch_transactions(&self, config: &ChartConfig) -> Result<Vec<Transaction>, ChartError> {
        let source = DataSource::parse(&config.transaction_source);
        let body = self.fetch_body(TRANSACTIONS, &source).await?;
        parse_transactions(TRANSACTIONS, &body)
    }

    /// Fetch and normalise both sources concurrently. Fails as soon as either
    /// side fails.
    #[instrument(skip_all, name = "source::load_chart_data")]
    pub async fn load_chart_data(&self, config: &ChartConfig) -> Result<ChartData, ChartError> {
        let (candles, transactions) =
            tokio::try_join!(self.fetch_candles(config), self.fetch_transactions(config))?;

        info!(
            candles = candles.len(),
            transactions = transactions.len(),
            series = %config.series,
            "chart data loaded"
        );

        Ok(ChartData {
            candles,
            transactions,
        })
    }
}
