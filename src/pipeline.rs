//! The single invocation boundary of the analysis.
//!
//! Normalizer, detector, and backtester run sequentially over one ticker's
//! bars with no shared mutable state; running twice on identical input
//! yields identical output.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backtest::{run_holding_period, SellResolution};
use crate::detect::detect_breakouts;
use crate::normalize::normalize;
use crate::types::{AnalysisError, AnalysisReport, ParameterError, RawBar, Symbol};

/// The scalar inputs of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisParams {
    pub ticker: Symbol,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Volume relative to the trailing 20-day average, in percent (>= 100)
    pub volume_threshold_pct: f64,
    /// Minimum day-over-day close change, in percent (> 0)
    pub price_change_threshold_pct: f64,
    /// Calendar days between buy and target sell date (>= 1)
    pub holding_period_days: u32,
    #[serde(default)]
    pub sell_resolution: SellResolution,
}

impl AnalysisParams {
    /// Domain checks, run before the pipeline touches any data
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.start > self.end {
            return Err(ParameterError::DateRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.volume_threshold_pct < 100.0 {
            return Err(ParameterError::VolumeThreshold(self.volume_threshold_pct));
        }
        if self.price_change_threshold_pct <= 0.0 {
            return Err(ParameterError::PriceChangeThreshold(
                self.price_change_threshold_pct,
            ));
        }
        if self.holding_period_days < 1 {
            return Err(ParameterError::HoldingPeriod(self.holding_period_days));
        }
        Ok(())
    }
}

/// Run normalize -> detect -> backtest over one ticker's raw bars.
pub fn run(params: &AnalysisParams, raw: Vec<RawBar>) -> Result<AnalysisReport, AnalysisError> {
    params.validate()?;

    let series = normalize(raw, params.start, params.end)?;
    info!(
        "{}: {} bars from {} to {}",
        params.ticker,
        series.len(),
        params.start,
        params.end
    );

    let events = detect_breakouts(
        &series,
        params.volume_threshold_pct,
        params.price_change_threshold_pct,
    );
    info!("{}: {} breakout days detected", params.ticker, events.len());

    let outcome = run_holding_period(
        &series,
        &events,
        params.holding_period_days,
        params.sell_resolution,
    );
    info!(
        "{}: {} trades evaluated, {} events unevaluable",
        params.ticker,
        outcome.trades.len(),
        outcome.skipped.len()
    );

    Ok(AnalysisReport {
        ticker: params.ticker.clone(),
        trades: outcome.trades,
        skipped: outcome.skipped,
    })
}
