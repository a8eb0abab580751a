//! Bar file loading and saving.
//!
//! Raw bars are cached on disk as CSV with a `date,open,high,low,close,volume`
//! header. Blank cells are preserved as missing values; filling them is the
//! normalizer's job, not the loader's.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::types::{RawBar, SchemaError, Symbol};

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Cache file name for a ticker's daily bars
pub fn cache_filename(ticker: &Symbol) -> String {
    format!("{}_daily.csv", ticker.as_str())
}

/// Load raw daily bars from a CSV file.
///
/// The header must name the `date`, `close`, and `volume` columns
/// (case-insensitive); `open`/`high`/`low` are optional. Blank cells
/// become `None`.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<RawBar>> {
    let mut reader = csv::Reader::from_path(path.as_ref())
        .with_context(|| format!("Failed to open {}", path.as_ref().display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let column = |name: &'static str| headers.iter().position(|h| h == name);

    let date_idx = column("date").ok_or(SchemaError::MissingColumn("date"))?;
    let close_idx = column("close").ok_or(SchemaError::MissingColumn("close"))?;
    let volume_idx = column("volume").ok_or(SchemaError::MissingColumn("volume"))?;
    let open_idx = column("open");
    let high_idx = column("high");
    let low_idx = column("low");

    let mut bars = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let row = row_idx + 2; // 1-based, after the header
        let record = result.with_context(|| format!("Failed to read row {}", row))?;

        let date_str = record.get(date_idx).unwrap_or("").trim();
        let date: NaiveDate = date_str.parse().map_err(|_| SchemaError::MalformedRow {
            row,
            message: format!("unparseable date '{}'", date_str),
        })?;

        let cell = |idx: Option<usize>| -> Result<Option<f64>, SchemaError> {
            let Some(idx) = idx else { return Ok(None) };
            let text = record.get(idx).unwrap_or("").trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>()
                .map(Some)
                .map_err(|_| SchemaError::MalformedRow {
                    row,
                    message: format!("unparseable number '{}'", text),
                })
        };

        bars.push(RawBar {
            date,
            open: cell(open_idx)?,
            high: cell(high_idx)?,
            low: cell(low_idx)?,
            close: cell(Some(close_idx))?,
            volume: cell(Some(volume_idx))?,
        });
    }

    info!("Loaded {} bars from {}", bars.len(), path.as_ref().display());
    Ok(bars)
}

/// Save raw bars to a CSV cache file; missing values become blank cells
pub fn save_csv(bars: &[RawBar], path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path.as_ref())
        .with_context(|| format!("Failed to create {}", path.as_ref().display()))?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(COLUMNS).context("Failed to write header")?;

    let fmt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();

    for bar in bars {
        writer
            .write_record(&[
                bar.date.format("%Y-%m-%d").to_string(),
                fmt(bar.open),
                fmt(bar.high),
                fmt(bar.low),
                fmt(bar.close),
                fmt(bar.volume),
            ])
            .context("Failed to write row")?;
    }

    writer.flush().context("Failed to flush CSV file")?;
    info!("Saved {} bars to {}", bars.len(), path.as_ref().display());
    Ok(())
}
