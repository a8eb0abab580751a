//! Breakout detection.
//!
//! A bar is a breakout when its volume exceeds the threshold multiple of the
//! trailing 20-bar average volume AND its day-over-day close change exceeds
//! the price threshold. Both comparisons are strict; a bar exactly at a
//! threshold does not qualify.

use tracing::debug;

use crate::indicators::{pct_change, rolling_mean};
use crate::types::{BreakoutEvent, PriceSeries};

/// Trailing window for the average-volume baseline
pub const VOLUME_LOOKBACK: usize = 20;

/// Scan a normalized series for breakout days.
///
/// `volume_threshold_pct` is relative to the trailing average (200 means
/// "more than 2x average volume"); `price_change_threshold_pct` is the
/// minimum day-over-day close change in percent. Bars without a full
/// 20-bar trailing window or without a previous close are never candidates.
pub fn detect_breakouts(
    series: &PriceSeries,
    volume_threshold_pct: f64,
    price_change_threshold_pct: f64,
) -> Vec<BreakoutEvent> {
    let volumes: Vec<f64> = series.bars().iter().map(|b| b.volume).collect();
    let closes: Vec<f64> = series.bars().iter().map(|b| b.close).collect();

    let avg_volume = rolling_mean(&volumes, VOLUME_LOOKBACK);
    let change_pct = pct_change(&closes);

    let mut events = Vec::new();

    for (i, bar) in series.bars().iter().enumerate() {
        let (avg, change) = match (avg_volume[i], change_pct[i]) {
            (Some(a), Some(c)) => (a, c),
            _ => continue,
        };

        if bar.volume > volume_threshold_pct / 100.0 * avg && change > price_change_threshold_pct {
            debug!(
                "Breakout on {}: volume {:.0} vs {:.0} avg, change {:+.2}%",
                bar.date, bar.volume, avg, change
            );
            events.push(BreakoutEvent { date: bar.date });
        }
    }

    debug!("Detected {} breakout days in {} bars", events.len(), series.len());
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;
    use chrono::{Days, NaiveDate};

    /// Consecutive calendar-day bars; gaps are irrelevant to the detector.
    fn make_series(closes: &[f64], volumes: &[f64]) -> PriceSeries {
        let start: NaiveDate = "2024-01-01".parse().unwrap();
        let bars = closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| Bar {
                date: start.checked_add_days(Days::new(i as u64)).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume,
            })
            .collect();
        PriceSeries::from_bars(bars).unwrap()
    }

    #[test]
    fn test_no_events_without_full_lookback() {
        // 10 bars of huge spikes: trailing window never fills
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64 * 10.0).collect();
        let volumes = vec![10_000.0; 10];
        let series = make_series(&closes, &volumes);

        assert!(detect_breakouts(&series, 100.0, 0.5).is_empty());
    }

    #[test]
    fn test_spike_on_day_21_detected() {
        // Flat until the last bar jumps +3% on 2.5x volume
        let mut closes = vec![100.0; 21];
        closes[20] = 103.0;
        let mut volumes = vec![100.0; 21];
        volumes[20] = 250.0;
        let series = make_series(&closes, &volumes);

        let events = detect_breakouts(&series, 200.0, 2.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].date, series.bars()[20].date);
    }

    #[test]
    fn test_price_comparison_is_strict() {
        let mut closes = vec![100.0; 21];
        closes[20] = 102.0; // exactly +2%
        let mut volumes = vec![100.0; 21];
        volumes[20] = 1000.0; // volume clearly above threshold
        let series = make_series(&closes, &volumes);

        assert!(detect_breakouts(&series, 200.0, 2.0).is_empty());
    }

    #[test]
    fn test_volume_comparison_is_strict() {
        let mut closes = vec![100.0; 21];
        closes[20] = 103.0; // price clearly above threshold
        let mut volumes = vec![90.0; 21];
        // Trailing window at i=20 holds 19 bars of 90 plus the spike:
        // avg = (1710 + 190) / 20 = 95, and 190 == 2 * 95 exactly
        volumes[20] = 190.0;
        let series = make_series(&closes, &volumes);

        assert!(detect_breakouts(&series, 200.0, 2.0).is_empty());
    }

    #[test]
    fn test_volume_alone_is_not_enough() {
        let closes = vec![100.0; 25];
        let mut volumes = vec![100.0; 25];
        volumes[22] = 1000.0;
        let series = make_series(&closes, &volumes);

        assert!(detect_breakouts(&series, 200.0, 2.0).is_empty());
    }

    #[test]
    fn test_raising_thresholds_never_adds_events() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i % 7) as f64).collect();
        let volumes: Vec<f64> = (0..60).map(|i| 100.0 + (i % 11) as f64 * 30.0).collect();
        let series = make_series(&closes, &volumes);

        let base = detect_breakouts(&series, 110.0, 0.1);
        let tighter_volume = detect_breakouts(&series, 150.0, 0.1);
        let tighter_price = detect_breakouts(&series, 110.0, 1.0);

        assert!(tighter_volume.len() <= base.len());
        assert!(tighter_price.len() <= base.len());
        // Monotone filter: tighter sets are subsets of the base set
        assert!(tighter_volume.iter().all(|e| base.contains(e)));
        assert!(tighter_price.iter().all(|e| base.contains(e)));
    }
}
