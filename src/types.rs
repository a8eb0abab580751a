//! Core data types used across the analysis pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal error classification for a pipeline run.
///
/// All three variants are reported to the caller as a structured
/// classification with a human-readable message; none aborts the process.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no price data for the requested range ({start} to {end})")]
    EmptyData { start: NaiveDate, end: NaiveDate },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    InvalidParameter(#[from] ParameterError),
}

/// Malformed or incomplete raw data (a provider/data problem, not a user one)
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("required column '{0}' missing from input")]
    MissingColumn(&'static str),

    #[error("bar {date}: close is missing and no prior close exists to fill from")]
    LeadingMissingClose { date: NaiveDate },

    #[error("bar {date}: close must be positive, got {close}")]
    NonPositiveClose { date: NaiveDate, close: f64 },

    #[error("row {row}: {message}")]
    MalformedRow { row: usize, message: String },
}

/// Parameter out of its allowed domain, caught before the pipeline runs
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("volume threshold must be >= 100%, got {0}")]
    VolumeThreshold(f64),

    #[error("price change threshold must be > 0%, got {0}")]
    PriceChangeThreshold(f64),

    #[error("holding period must be >= 1 day, got {0}")]
    HoldingPeriod(u32),

    #[error("start date {start} is after end date {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },
}

/// Equity ticker symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Symbol(s.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One day's record as delivered by a provider, before normalization.
///
/// Field-level gaps are modeled as `None`; a wholly absent required column
/// is a [`SchemaError`] at load time instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

/// One trading day's OHLCV record after normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Ordered daily series, strictly increasing by date, no duplicates.
///
/// Constructed once by the normalizer (or [`PriceSeries::from_bars`]) and
/// immutable thereafter. Derived columns are computed by consumers, not
/// stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series from already-clean bars, enforcing the output
    /// guarantees of the normalizer: strictly increasing dates and
    /// positive closes.
    pub fn from_bars(bars: Vec<Bar>) -> Result<Self, SchemaError> {
        for (i, bar) in bars.iter().enumerate() {
            if bar.close <= 0.0 {
                return Err(SchemaError::NonPositiveClose {
                    date: bar.date,
                    close: bar.close,
                });
            }
            if i > 0 && bar.date <= bars[i - 1].date {
                return Err(SchemaError::MalformedRow {
                    row: i,
                    message: format!("date {} does not follow {}", bar.date, bars[i - 1].date),
                });
            }
        }
        Ok(PriceSeries { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Position of an exact trading day, if present
    pub fn position_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    /// Position of the earliest trading day on or after `date`, if any
    pub fn position_on_or_after(&self, date: NaiveDate) -> Option<usize> {
        match self.bars.binary_search_by_key(&date, |b| b.date) {
            Ok(i) => Some(i),
            Err(i) if i < self.bars.len() => Some(i),
            Err(_) => None,
        }
    }
}

/// A trading day satisfying the breakout predicate.
///
/// Carries nothing beyond the reference date; diagnostic values are logged
/// by the detector rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakoutEvent {
    pub date: NaiveDate,
}

/// Result of evaluating one breakout event.
///
/// Prices and return are unrounded; rounding to 2 decimal places happens
/// only in the report assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub breakout_date: NaiveDate,
    pub buy_price: f64,
    pub sell_date: NaiveDate,
    pub sell_price: f64,
    pub return_pct: f64,
}

/// Why a breakout event produced no trade record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Target sell date lies beyond the last available bar
    BeyondSeriesEnd,
    /// Target sell date is not a trading day (exact-date policy only)
    NotATradingDay,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::BeyondSeriesEnd => {
                write!(f, "insufficient trailing data for holding period")
            }
            SkipReason::NotATradingDay => {
                write!(f, "target sell date is not a trading day")
            }
        }
    }
}

/// A breakout event that could not be resolved to a valid sell date
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SkippedEvent {
    pub date: NaiveDate,
    pub reason: SkipReason,
}

/// Everything the report assembler needs for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub ticker: Symbol,
    pub trades: Vec<TradeRecord>,
    pub skipped: Vec<SkippedEvent>,
}
