//! Report assembly.
//!
//! Renders a pipeline run as a ruled text table and as a CSV artifact.
//! This is the only place prices and returns are rounded (2 decimal
//! places); the records themselves stay unrounded.

use std::io;

use anyhow::{Context, Result};
use rust_decimal::Decimal;

use crate::types::AnalysisReport;

/// Literal header of the CSV artifact
pub const CSV_HEADER: [&str; 5] = [
    "Breakout Date",
    "Buy Price",
    "Sell Date",
    "Sell Price",
    "Return (%)",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Presentation-time rounding; NaN and infinities collapse to zero
fn round2(value: f64) -> Decimal {
    Decimal::from_f64_retain(value)
        .unwrap_or(Decimal::ZERO)
        .round_dp(2)
}

/// Render the result table the way the CLI prints it
pub fn render_table(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let rule = "=".repeat(72);
    let thin_rule = "-".repeat(72);

    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!("BREAKOUT ANALYSIS: {}\n", report.ticker));
    out.push_str(&rule);
    out.push('\n');

    if report.trades.is_empty() {
        out.push_str("No breakout days found based on the criteria.\n");
    } else {
        out.push_str(&format!(
            "{:<14} {:>12} {:<14} {:>12} {:>12}\n",
            CSV_HEADER[0], CSV_HEADER[1], CSV_HEADER[2], CSV_HEADER[3], CSV_HEADER[4]
        ));
        out.push_str(&thin_rule);
        out.push('\n');

        for trade in &report.trades {
            // Stringify first: width specs are ignored by the date and
            // decimal Display impls
            out.push_str(&format!(
                "{:<14} {:>12} {:<14} {:>12} {:>12}\n",
                trade.breakout_date.format(DATE_FORMAT).to_string(),
                round2(trade.buy_price).to_string(),
                trade.sell_date.format(DATE_FORMAT).to_string(),
                round2(trade.sell_price).to_string(),
                round2(trade.return_pct).to_string(),
            ));
        }
    }

    if !report.skipped.is_empty() {
        out.push_str(&thin_rule);
        out.push('\n');
        out.push_str("Unevaluable breakout days:\n");
        for skipped in &report.skipped {
            out.push_str(&format!(
                "  {}  ({})\n",
                skipped.date.format(DATE_FORMAT),
                skipped.reason
            ));
        }
    }

    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!(
        "Trades: {}    Unevaluable: {}\n",
        report.trades.len(),
        report.skipped.len()
    ));
    out.push_str(&rule);
    out.push('\n');

    out
}

/// Write the trade table as CSV with the fixed report header
pub fn write_csv<W: io::Write>(report: &AnalysisReport, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(CSV_HEADER)
        .context("Failed to write CSV header")?;

    for trade in &report.trades {
        csv_writer
            .write_record(&[
                trade.breakout_date.format(DATE_FORMAT).to_string(),
                round2(trade.buy_price).to_string(),
                trade.sell_date.format(DATE_FORMAT).to_string(),
                round2(trade.sell_price).to_string(),
                round2(trade.return_pct).to_string(),
            ])
            .context("Failed to write CSV row")?;
    }

    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}
