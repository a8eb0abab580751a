//! Market-data providers.
//!
//! The core pipeline only requires "a raw bar collection"; everything about
//! where bars come from, including the primary-then-fallback composition,
//! lives here at the edge. All fetches are synchronous.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::ProviderConfig;
use crate::data;
use crate::types::{RawBar, Symbol};

/// External collaborator that supplies one ticker's daily bars.
///
/// Implementations either return a (possibly unsorted, possibly gapped)
/// collection scoped to the request or fail; cleaning is the normalizer's
/// concern.
pub trait BarProvider {
    fn name(&self) -> &'static str;

    fn fetch_daily(
        &self,
        ticker: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>>;
}

// =============================================================================
// Alpha Vantage
// =============================================================================

/// Daily bars from the Alpha Vantage `TIME_SERIES_DAILY` endpoint.
///
/// Authentication is a plain `apikey` query parameter. The API reports
/// problems inside a 200 response body (`Error Message`, rate-limit
/// `Note`/`Information`), so those payloads are checked before the series.
pub struct AlphaVantageClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    series: Option<BTreeMap<NaiveDate, DailyFields>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyFields {
    #[serde(rename = "1. open")]
    open: Option<String>,
    #[serde(rename = "2. high")]
    high: Option<String>,
    #[serde(rename = "3. low")]
    low: Option<String>,
    #[serde(rename = "4. close")]
    close: Option<String>,
    #[serde(rename = "5. volume")]
    volume: Option<String>,
}

impl AlphaVantageClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("No Alpha Vantage API key configured (set ALPHAVANTAGE_API_KEY)")?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
        })
    }
}

fn parse_field(value: Option<String>) -> Option<f64> {
    value.and_then(|s| s.trim().parse().ok())
}

fn response_to_bars(
    response: DailyResponse,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<RawBar>> {
    if let Some(message) = response.error_message {
        bail!("Alpha Vantage error: {}", message);
    }
    if let Some(note) = response.note.or(response.information) {
        bail!("Alpha Vantage rejected the request: {}", note);
    }

    let series = response
        .series
        .context("Response contains no 'Time Series (Daily)' section")?;

    // BTreeMap iteration is already date-ascending
    let bars = series
        .into_iter()
        .filter(|(date, _)| *date >= start && *date <= end)
        .map(|(date, fields)| RawBar {
            date,
            open: parse_field(fields.open),
            high: parse_field(fields.high),
            low: parse_field(fields.low),
            close: parse_field(fields.close),
            volume: parse_field(fields.volume),
        })
        .collect();

    Ok(bars)
}

impl BarProvider for AlphaVantageClient {
    fn name(&self) -> &'static str {
        "alpha_vantage"
    }

    fn fetch_daily(
        &self,
        ticker: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>> {
        info!("Fetching {} daily bars from Alpha Vantage", ticker);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", ticker.as_str()),
                ("outputsize", "full"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .context("Failed to send request")?;

        if !response.status().is_success() {
            bail!("API returned status: {}", response.status());
        }

        let parsed: DailyResponse = response.json().context("Failed to parse response")?;
        let bars = response_to_bars(parsed, start, end)?;

        info!("Fetched {} bars for {}", bars.len(), ticker);
        Ok(bars)
    }
}

// =============================================================================
// Local CSV cache
// =============================================================================

/// Bars from `{TICKER}_daily.csv` files under a data directory
pub struct CsvBarProvider {
    data_dir: PathBuf,
}

impl CsvBarProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl BarProvider for CsvBarProvider {
    fn name(&self) -> &'static str {
        "csv_cache"
    }

    fn fetch_daily(
        &self,
        ticker: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>> {
        let path = self.data_dir.join(data::cache_filename(ticker));
        let bars = data::load_csv(&path)?;
        Ok(bars
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect())
    }
}

// =============================================================================
// Fallback composition
// =============================================================================

/// Try the primary source; on failure or an empty result, try the secondary.
pub struct FallbackProvider {
    primary: Box<dyn BarProvider>,
    secondary: Box<dyn BarProvider>,
}

impl FallbackProvider {
    pub fn new(primary: Box<dyn BarProvider>, secondary: Box<dyn BarProvider>) -> Self {
        Self { primary, secondary }
    }
}

impl BarProvider for FallbackProvider {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn fetch_daily(
        &self,
        ticker: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>> {
        match self.primary.fetch_daily(ticker, start, end) {
            Ok(bars) if !bars.is_empty() => Ok(bars),
            Ok(_) => {
                warn!(
                    "{} returned no data for {}, trying {}",
                    self.primary.name(),
                    ticker,
                    self.secondary.name()
                );
                self.secondary.fetch_daily(ticker, start, end)
            }
            Err(err) => {
                warn!(
                    "{} failed for {} ({:#}), trying {}",
                    self.primary.name(),
                    ticker,
                    err,
                    self.secondary.name()
                );
                self.secondary.fetch_daily(ticker, start, end)
            }
        }
    }
}
