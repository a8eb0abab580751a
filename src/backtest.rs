//! Fixed holding-period backtesting.
//!
//! Each breakout is simulated as buy-at-close on the breakout day and
//! sell-at-close once the holding period (calendar days) has elapsed.
//! Only already-available history is consulted: an event whose sell date
//! cannot be resolved inside the series produces no trade.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{BreakoutEvent, PriceSeries, SkipReason, SkippedEvent, TradeRecord};

/// How a target sell date that is not a trading day gets resolved.
///
/// An explicit policy rather than a hidden assumption; earlier script
/// variants of this analysis disagreed on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellResolution {
    /// Sell on the target date when it trades, otherwise on the earliest
    /// trading day strictly after it. Reference policy.
    #[default]
    NextTradingDay,
    /// Sell only when the target date is itself a trading day; weekend and
    /// holiday targets are skipped. Matches the legacy exact-match lookup.
    ExactDateOnly,
}

/// Trades plus the events that could not be evaluated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktestOutcome {
    pub trades: Vec<TradeRecord>,
    pub skipped: Vec<SkippedEvent>,
}

/// Evaluate each breakout event against the series.
///
/// Skipped events are collected, not raised: one unresolvable breakout
/// never discards the rest of the batch. Prices stay unrounded here.
pub fn run_holding_period(
    series: &PriceSeries,
    events: &[BreakoutEvent],
    holding_period_days: u32,
    resolution: SellResolution,
) -> BacktestOutcome {
    let mut outcome = BacktestOutcome::default();

    for event in events {
        let buy_idx = match series.position_of(event.date) {
            Some(i) => i,
            None => {
                warn!("Breakout date {} not present in series, ignoring", event.date);
                continue;
            }
        };

        let buy_price = series.bars()[buy_idx].close;
        let target = event.date + Duration::days(i64::from(holding_period_days));

        let sell_idx = match resolve_sell_index(series, target, resolution) {
            Ok(i) => i,
            Err(reason) => {
                warn!("Breakout {} skipped: {}", event.date, reason);
                outcome.skipped.push(SkippedEvent {
                    date: event.date,
                    reason,
                });
                continue;
            }
        };

        let sell_bar = &series.bars()[sell_idx];
        let return_pct = (sell_bar.close - buy_price) / buy_price * 100.0;

        debug!(
            "Trade: buy {} @ {:.4}, sell {} @ {:.4} ({:+.2}%)",
            event.date, buy_price, sell_bar.date, sell_bar.close, return_pct
        );

        outcome.trades.push(TradeRecord {
            breakout_date: event.date,
            buy_price,
            sell_date: sell_bar.date,
            sell_price: sell_bar.close,
            return_pct,
        });
    }

    outcome
}

fn resolve_sell_index(
    series: &PriceSeries,
    target: chrono::NaiveDate,
    resolution: SellResolution,
) -> Result<usize, SkipReason> {
    match resolution {
        SellResolution::NextTradingDay => series
            .position_on_or_after(target)
            .ok_or(SkipReason::BeyondSeriesEnd),
        SellResolution::ExactDateOnly => {
            let past_end = series.last().map(|b| target > b.date).unwrap_or(true);
            if past_end {
                return Err(SkipReason::BeyondSeriesEnd);
            }
            series
                .position_of(target)
                .ok_or(SkipReason::NotATradingDay)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;
    use approx::assert_relative_eq;
    use chrono::{Datelike, Days, NaiveDate, Weekday};

    /// Weekday-only bars starting Mon 2024-01-01, close = 100 + i
    fn make_weekday_series(count: usize) -> PriceSeries {
        let start: NaiveDate = "2024-01-01".parse().unwrap();
        let mut bars = Vec::new();
        let mut date = start;
        for i in 0..count {
            while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                date = date.checked_add_days(Days::new(1)).unwrap();
            }
            bars.push(Bar {
                date,
                open: 100.0,
                high: 100.0,
                low: 100.0,
                close: 100.0 + i as f64,
                volume: 1000.0,
            });
            date = date.checked_add_days(Days::new(1)).unwrap();
        }
        PriceSeries::from_bars(bars).unwrap()
    }

    fn event(date: &str) -> BreakoutEvent {
        BreakoutEvent {
            date: date.parse().unwrap(),
        }
    }

    #[test]
    fn test_exact_target_trading_day() {
        let series = make_weekday_series(10);
        // Mon 2024-01-01 + 3 days = Thu 2024-01-04, a trading day
        let outcome = run_holding_period(
            &series,
            &[event("2024-01-01")],
            3,
            SellResolution::NextTradingDay,
        );

        assert_eq!(outcome.trades.len(), 1);
        assert!(outcome.skipped.is_empty());
        let trade = &outcome.trades[0];
        assert_eq!(trade.sell_date, "2024-01-04".parse::<NaiveDate>().unwrap());
        assert_relative_eq!(trade.buy_price, 100.0);
        assert_relative_eq!(trade.sell_price, 103.0);
        assert_relative_eq!(trade.return_pct, 3.0);
    }

    #[test]
    fn test_weekend_target_rolls_to_next_trading_day() {
        let series = make_weekday_series(10);
        // Wed 2024-01-03 + 3 days = Sat 2024-01-06 -> Mon 2024-01-08
        let outcome = run_holding_period(
            &series,
            &[event("2024-01-03")],
            3,
            SellResolution::NextTradingDay,
        );

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(
            outcome.trades[0].sell_date,
            "2024-01-08".parse::<NaiveDate>().unwrap()
        );
    }

    #[test]
    fn test_weekend_target_skipped_under_exact_policy() {
        let series = make_weekday_series(10);
        let outcome = run_holding_period(
            &series,
            &[event("2024-01-03")],
            3,
            SellResolution::ExactDateOnly,
        );

        assert!(outcome.trades.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].reason, SkipReason::NotATradingDay);
    }

    #[test]
    fn test_event_on_last_bar_is_skipped() {
        let series = make_weekday_series(10);
        let last = series.last().unwrap().date;
        let outcome = run_holding_period(
            &series,
            &[BreakoutEvent { date: last }],
            10,
            SellResolution::NextTradingDay,
        );

        assert!(outcome.trades.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].date, last);
        assert_eq!(outcome.skipped[0].reason, SkipReason::BeyondSeriesEnd);
    }

    #[test]
    fn test_one_bad_event_does_not_abort_the_batch() {
        let series = make_weekday_series(10);
        let last = series.last().unwrap().date;
        let outcome = run_holding_period(
            &series,
            &[event("2024-01-01"), BreakoutEvent { date: last }],
            3,
            SellResolution::NextTradingDay,
        );

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
    }

    #[test]
    fn test_sell_date_strictly_after_breakout() {
        let series = make_weekday_series(30);
        let events: Vec<BreakoutEvent> = series
            .bars()
            .iter()
            .map(|b| BreakoutEvent { date: b.date })
            .collect();

        for holding in [1u32, 5, 10] {
            let outcome =
                run_holding_period(&series, &events, holding, SellResolution::NextTradingDay);
            for trade in &outcome.trades {
                assert!(trade.sell_date > trade.breakout_date);
                assert!(series.position_of(trade.sell_date).is_some());
            }
        }
    }

    #[test]
    fn test_return_pct_round_trip() {
        let series = make_weekday_series(20);
        let outcome = run_holding_period(
            &series,
            &[event("2024-01-02")],
            7,
            SellResolution::NextTradingDay,
        );

        let trade = &outcome.trades[0];
        let recomputed = (trade.sell_price - trade.buy_price) / trade.buy_price * 100.0;
        assert_relative_eq!(recomputed, trade.return_pct);
    }
}
