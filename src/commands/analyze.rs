//! Analyze command implementation

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use breakout_analysis::provider::{
    AlphaVantageClient, BarProvider, CsvBarProvider, FallbackProvider,
};
use breakout_analysis::{data, pipeline, report};
use breakout_analysis::{AnalysisParams, Config, SellResolution, Symbol};

#[allow(clippy::too_many_arguments)]
pub fn run(
    config_path: Option<String>,
    ticker: String,
    start: String,
    end: String,
    volume_threshold: Option<f64>,
    price_threshold: Option<f64>,
    holding_period: Option<u32>,
    exact_sell_date: bool,
    data_file: Option<String>,
    output: Option<String>,
) -> Result<()> {
    info!("Starting breakout analysis");

    let config = match config_path {
        Some(path) => {
            let config = Config::from_file(&path)?;
            info!("Loaded configuration from: {}", path);
            config
        }
        None => Config::from_env(),
    };

    let ticker = Symbol::new(ticker);
    let start = parse_date(&start).context("Invalid --start date")?;
    let end = parse_date(&end).context("Invalid --end date")?;

    let sell_resolution = if exact_sell_date {
        SellResolution::ExactDateOnly
    } else {
        config.analysis.sell_resolution
    };

    let params = AnalysisParams {
        ticker: ticker.clone(),
        start,
        end,
        volume_threshold_pct: volume_threshold.unwrap_or(config.analysis.volume_threshold_pct),
        price_change_threshold_pct: price_threshold
            .unwrap_or(config.analysis.price_change_threshold_pct),
        holding_period_days: holding_period.unwrap_or(config.analysis.holding_period_days),
        sell_resolution,
    };

    let raw = match data_file {
        Some(path) => {
            info!("Loading bars from file: {}", path);
            data::load_csv(&path)?
        }
        None => build_provider(&config).fetch_daily(&ticker, start, end)?,
    };

    let analysis = pipeline::run(&params, raw)
        .with_context(|| format!("Analysis failed for {}", ticker))?;

    println!("{}", report::render_table(&analysis));

    let output_path = match output {
        Some(path) => PathBuf::from(path),
        None => {
            let results_dir = PathBuf::from(&config.output.results_dir);
            std::fs::create_dir_all(&results_dir)
                .with_context(|| format!("Failed to create {}", results_dir.display()))?;
            results_dir.join(format!("{}_breakout_analysis.csv", ticker.as_str()))
        }
    };

    let file = File::create(&output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    report::write_csv(&analysis, file)?;
    println!("Report written to {}", output_path.display());

    info!("Analysis completed successfully");
    Ok(())
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .with_context(|| format!("'{}' is not a YYYY-MM-DD date", text))
}

/// Alpha Vantage with the local CSV cache as fallback; cache only when no
/// API key is configured.
fn build_provider(config: &Config) -> Box<dyn BarProvider> {
    let cache = CsvBarProvider::new(&config.provider.data_dir);
    match AlphaVantageClient::new(&config.provider) {
        Ok(client) => Box::new(FallbackProvider::new(Box::new(client), Box::new(cache))),
        Err(err) => {
            info!("Alpha Vantage unavailable ({:#}), using CSV cache only", err);
            Box::new(cache)
        }
    }
}
