//! Configuration management.
//!
//! JSON configuration file with environment variable support for the
//! provider API key. Every section has defaults, so the tool runs without
//! a config file at all; CLI flags override whatever is loaded.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::backtest::SellResolution;

const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub analysis: AnalysisDefaults,
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(api_key) = std::env::var("ALPHAVANTAGE_API_KEY") {
            self.provider.api_key = Some(api_key);
        }
    }
}

/// Market-data provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Directory of cached `{TICKER}_daily.csv` files, also the fallback source
    pub data_dir: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            api_key: None,
            base_url: ALPHA_VANTAGE_URL.to_string(),
            timeout_secs: 30,
            data_dir: "data".to_string(),
        }
    }
}

/// Detection and backtest defaults, matching the original report form
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisDefaults {
    pub volume_threshold_pct: f64,
    pub price_change_threshold_pct: f64,
    pub holding_period_days: u32,
    pub sell_resolution: SellResolution,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        AnalysisDefaults {
            volume_threshold_pct: 200.0,
            price_change_threshold_pct: 2.0,
            holding_period_days: 10,
            sell_resolution: SellResolution::NextTradingDay,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub results_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            results_dir: "results".to_string(),
        }
    }
}
