//! Raw bar normalization.
//!
//! Turns a possibly-unsorted, possibly-gapped provider collection into a
//! [`PriceSeries`] fit for analysis: filtered to the requested range, sorted,
//! deduplicated, and with no missing close or volume values.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::types::{AnalysisError, Bar, PriceSeries, RawBar, SchemaError};

/// Normalize raw provider bars for `[start, end]` into a clean series.
///
/// Policies, in application order:
/// - bars outside the range are dropped; nothing left -> `EmptyData`
/// - ascending sort by date; exact duplicate dates keep the first occurrence
/// - missing volume becomes 0.0 (no trade occurred)
/// - missing close is forward-filled from the most recent prior close; a
///   leading missing close is a `SchemaError`
/// - missing open/high/low are filled from that bar's close (unused
///   downstream, but the output type is complete)
pub fn normalize(
    raw: Vec<RawBar>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, AnalysisError> {
    let total = raw.len();
    let mut in_range: Vec<RawBar> = raw
        .into_iter()
        .filter(|b| b.date >= start && b.date <= end)
        .collect();

    debug!(
        "Normalizing {} of {} raw bars within {} to {}",
        in_range.len(),
        total,
        start,
        end
    );

    if in_range.is_empty() {
        return Err(AnalysisError::EmptyData { start, end });
    }

    // Stable sort, then keep the first occurrence of each date
    in_range.sort_by_key(|b| b.date);
    let before = in_range.len();
    in_range.dedup_by_key(|b| b.date);
    if in_range.len() < before {
        warn!("Dropped {} duplicate-date bars (kept first)", before - in_range.len());
    }

    let mut bars = Vec::with_capacity(in_range.len());
    let mut prev_close: Option<f64> = None;

    for raw_bar in in_range {
        let close = match raw_bar.close.or(prev_close) {
            Some(c) => c,
            None => {
                return Err(SchemaError::LeadingMissingClose { date: raw_bar.date }.into());
            }
        };
        prev_close = Some(close);

        if close <= 0.0 {
            return Err(SchemaError::NonPositiveClose {
                date: raw_bar.date,
                close,
            }
            .into());
        }

        bars.push(Bar {
            date: raw_bar.date,
            open: raw_bar.open.unwrap_or(close),
            high: raw_bar.high.unwrap_or(close),
            low: raw_bar.low.unwrap_or(close),
            close,
            volume: raw_bar.volume.unwrap_or(0.0),
        });
    }

    let series = PriceSeries::from_bars(bars)?;
    debug!(
        "Normalized series: {} bars, {} to {}",
        series.len(),
        series.first().map(|b| b.date).unwrap_or(start),
        series.last().map(|b| b.date).unwrap_or(end),
    );

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, close: Option<f64>, volume: Option<f64>) -> RawBar {
        RawBar {
            date: date.parse().unwrap(),
            open: None,
            high: None,
            low: None,
            close,
            volume,
        }
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_after_filter_is_empty_data() {
        let raw_bars = vec![raw("2020-01-02", Some(10.0), Some(100.0))];
        let err = normalize(raw_bars, d("2024-01-01"), d("2024-12-31")).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyData { .. }));
    }

    #[test]
    fn test_sorts_and_dedups_keeping_first() {
        let raw_bars = vec![
            raw("2024-01-03", Some(11.0), Some(100.0)),
            raw("2024-01-02", Some(10.0), Some(100.0)),
            raw("2024-01-03", Some(99.0), Some(100.0)),
        ];
        let series = normalize(raw_bars, d("2024-01-01"), d("2024-01-31")).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].date, d("2024-01-02"));
        // First occurrence of 2024-01-03 wins; sort is stable so input order
        // among equal dates is preserved
        assert_eq!(series.bars()[1].close, 11.0);
    }

    #[test]
    fn test_forward_fills_close_and_zero_fills_volume() {
        let raw_bars = vec![
            raw("2024-01-02", Some(10.0), Some(100.0)),
            raw("2024-01-03", None, None),
            raw("2024-01-04", Some(12.0), Some(300.0)),
        ];
        let series = normalize(raw_bars, d("2024-01-01"), d("2024-01-31")).unwrap();

        assert_eq!(series.bars()[1].close, 10.0);
        assert_eq!(series.bars()[1].volume, 0.0);
        assert_eq!(series.bars()[2].close, 12.0);
    }

    #[test]
    fn test_leading_missing_close_is_schema_error() {
        let raw_bars = vec![
            raw("2024-01-02", None, Some(100.0)),
            raw("2024-01-03", Some(10.0), Some(100.0)),
        ];
        let err = normalize(raw_bars, d("2024-01-01"), d("2024-01-31")).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Schema(SchemaError::LeadingMissingClose { .. })
        ));
    }

    #[test]
    fn test_non_positive_close_is_schema_error() {
        let raw_bars = vec![raw("2024-01-02", Some(-5.0), Some(100.0))];
        let err = normalize(raw_bars, d("2024-01-01"), d("2024-01-31")).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Schema(SchemaError::NonPositiveClose { .. })
        ));
    }

    #[test]
    fn test_missing_ohl_filled_from_close() {
        let raw_bars = vec![raw("2024-01-02", Some(10.0), Some(100.0))];
        let series = normalize(raw_bars, d("2024-01-01"), d("2024-01-31")).unwrap();
        let bar = &series.bars()[0];
        assert_eq!(bar.open, 10.0);
        assert_eq!(bar.high, 10.0);
        assert_eq!(bar.low, 10.0);
    }

    #[test]
    fn test_output_invariants_hold() {
        let raw_bars = vec![
            raw("2024-01-05", None, None),
            raw("2024-01-02", Some(10.0), Some(100.0)),
            raw("2024-01-04", Some(11.0), None),
            raw("2024-01-02", Some(10.5), Some(150.0)),
        ];
        let series = normalize(raw_bars, d("2024-01-01"), d("2024-01-31")).unwrap();

        assert!(!series.is_empty());
        for pair in series.bars().windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
        for bar in series.bars() {
            assert!(bar.close > 0.0);
            assert!(bar.volume >= 0.0);
        }
    }
}
