//! Download command - fetch daily bars and cache them as CSV

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use breakout_analysis::provider::{AlphaVantageClient, BarProvider};
use breakout_analysis::{data, Config, Symbol};

pub fn run(
    config_path: Option<String>,
    tickers: String,
    start: String,
    end: String,
    output: Option<String>,
) -> Result<()> {
    info!("Starting data download");

    let config = match config_path {
        Some(path) => Config::from_file(&path)?,
        None => Config::from_env(),
    };

    let start: NaiveDate = NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d")
        .context("Invalid --start date")?;
    let end: NaiveDate =
        NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d").context("Invalid --end date")?;

    let output_dir = PathBuf::from(output.unwrap_or_else(|| config.provider.data_dir.clone()));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let client = AlphaVantageClient::new(&config.provider)?;
    let symbols: Vec<Symbol> = tickers.split(',').map(|t| Symbol::new(t.trim())).collect();

    println!("\n{}", "=".repeat(60));
    println!("DOWNLOADING DAILY BARS");
    println!("{}", "=".repeat(60));
    println!("  Tickers: {}", tickers);
    println!("  Range:   {} to {}", start, end);
    println!("  Output:  {}", output_dir.display());
    println!("{}\n", "=".repeat(60));

    let mut success_count = 0;
    let mut total_bars = 0;

    for symbol in &symbols {
        print!("  Downloading {}... ", symbol);

        match client.fetch_daily(symbol, start, end) {
            Ok(bars) if bars.is_empty() => {
                println!("✗ No data in range");
            }
            Ok(bars) => {
                let path = output_dir.join(data::cache_filename(symbol));
                match data::save_csv(&bars, &path) {
                    Ok(()) => {
                        println!("✓ {} bars", bars.len());
                        total_bars += bars.len();
                        success_count += 1;
                    }
                    Err(e) => println!("✗ Error: {}", e),
                }
            }
            Err(e) => println!("✗ Error: {}", e),
        }
    }

    println!("\n{}", "=".repeat(60));
    println!(
        "Downloaded {} bars across {}/{} tickers",
        total_bars,
        success_count,
        symbols.len()
    );
    println!("{}", "=".repeat(60));

    info!("Download completed");
    Ok(())
}
