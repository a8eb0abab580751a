//! Stock Breakout Analysis
//!
//! Detects "breakout" trading days for a single equity (days where volume
//! and price movement both exceed configurable thresholds) and backtests a
//! fixed holding-period trade after each breakout. The pipeline is a pure
//! function of its inputs: raw daily bars are normalized into a clean
//! series, scanned for breakouts against a trailing 20-day volume baseline,
//! and each breakout is evaluated buy-at-close / sell-at-close without ever
//! consulting data past the series end.

pub mod backtest;
pub mod config;
pub mod data;
pub mod detect;
pub mod indicators;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod report;
pub mod types;

pub use backtest::SellResolution;
pub use config::Config;
pub use pipeline::AnalysisParams;
pub use types::*;
