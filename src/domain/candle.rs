//! Hourly bars and their morning/afternoon aggregates.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyBar {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Morning,
    Afternoon,
}

/// OHLCV for one half of a trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HalfDayCandle {
    pub date: NaiveDate,
    pub period: Period,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl HalfDayCandle {
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// range / open; infinite for a zero open so sizing collapses to zero.
    pub fn volatility(&self) -> f64 {
        if self.open == 0.0 {
            return f64::INFINITY;
        }
        self.range() / self.open
    }

    pub fn return_rate(&self) -> f64 {
        if self.open == 0.0 {
            return 0.0;
        }
        (self.close - self.open) / self.open
    }

    /// 1 - |close - open| / range. `None` when the candle never moved.
    pub fn noise(&self) -> Option<f64> {
        let range = self.range();
        if range <= 0.0 {
            return None;
        }
        Some(1.0 - (self.close - self.open).abs() / range)
    }
}

/// Fold hourly bars into morning/afternoon candles for the latest `days`
/// complete days strictly before `today`.
///
/// Bars are bucketed by their local date and split at `split`. A day lacking
/// either half is skipped. Output is chronological, morning before afternoon.
pub fn aggregate_half_days(
    bars: &[HourlyBar],
    today: NaiveDate,
    days: usize,
    split: NaiveTime,
) -> Vec<HalfDayCandle> {
    let mut by_day: BTreeMap<NaiveDate, (Vec<&HourlyBar>, Vec<&HourlyBar>)> = BTreeMap::new();
    for bar in bars {
        let date = bar.timestamp.date_naive();
        if date >= today {
            continue;
        }
        let entry = by_day.entry(date).or_default();
        if bar.timestamp.time() < split {
            entry.0.push(bar);
        } else {
            entry.1.push(bar);
        }
    }

    let complete: Vec<_> = by_day
        .into_iter()
        .filter_map(|(date, (morning, afternoon))| {
            let morning = aggregate(&morning, date, Period::Morning)?;
            let afternoon = aggregate(&afternoon, date, Period::Afternoon)?;
            Some([morning, afternoon])
        })
        .collect();

    let skip = complete.len().saturating_sub(days);
    complete.into_iter().skip(skip).flatten().collect()
}

fn aggregate(bars: &[&HourlyBar], date: NaiveDate, period: Period) -> Option<HalfDayCandle> {
    let mut sorted = bars.to_vec();
    sorted.sort_by_key(|b| b.timestamp);
    let first = sorted.first()?;
    let last = sorted.last()?;
    Some(HalfDayCandle {
        date,
        period,
        open: first.open,
        high: sorted.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
        low: sorted.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
        close: last.close,
        volume: sorted.iter().map(|b| b.volume).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> HalfDayCandle {
        HalfDayCandle {
            date: NaiveDate::from_ymd_opt(2025, 10, 13).unwrap(),
            period: Period::Morning,
            open,
            high,
            low,
            close,
            volume: 1234.56,
        }
    }

    fn bar(day: u32, hour: u32, price: f64) -> HourlyBar {
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        HourlyBar {
            timestamp: offset.with_ymd_and_hms(2025, 10, day, hour, 0, 0).unwrap(),
            open: price,
            high: price + 2.0,
            low: price - 1.0,
            close: price + 1.0,
            volume: 10.0,
        }
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn range_is_high_minus_low() {
        assert_eq!(candle(50000.0, 51000.0, 49000.0, 50500.0).range(), 2000.0);
    }

    #[test]
    fn volatility_is_range_over_open() {
        let c = candle(50000.0, 51000.0, 49000.0, 50500.0);
        assert!((c.volatility() - 0.04).abs() < 1e-12);
    }

    #[test]
    fn volatility_with_zero_open_is_infinite() {
        assert!(candle(0.0, 1.0, 0.0, 1.0).volatility().is_infinite());
    }

    #[test]
    fn return_rate() {
        let c = candle(100.0, 110.0, 95.0, 105.0);
        assert!((c.return_rate() - 0.05).abs() < 1e-12);
        assert_eq!(candle(0.0, 1.0, 0.0, 1.0).return_rate(), 0.0);
    }

    #[test]
    fn noise_of_full_body_candle_is_zero() {
        let c = candle(100.0, 110.0, 100.0, 110.0);
        assert_eq!(c.noise(), Some(0.0));
    }

    #[test]
    fn noise_of_doji_is_one() {
        let c = candle(100.0, 110.0, 90.0, 100.0);
        assert_eq!(c.noise(), Some(1.0));
    }

    #[test]
    fn noise_of_flat_candle_is_none() {
        assert_eq!(candle(100.0, 100.0, 100.0, 100.0).noise(), None);
    }

    #[test]
    fn aggregates_morning_and_afternoon() {
        let bars: Vec<_> = (0..24).map(|h| bar(13, h, 100.0 + h as f64)).collect();
        let today = NaiveDate::from_ymd_opt(2025, 10, 14).unwrap();
        let candles = aggregate_half_days(&bars, today, 20, noon());

        assert_eq!(candles.len(), 2);
        let morning = &candles[0];
        assert_eq!(morning.period, Period::Morning);
        assert_eq!(morning.open, 100.0);
        assert_eq!(morning.close, 112.0);
        assert_eq!(morning.high, 113.0);
        assert_eq!(morning.low, 99.0);
        assert_eq!(morning.volume, 120.0);

        let afternoon = &candles[1];
        assert_eq!(afternoon.period, Period::Afternoon);
        assert_eq!(afternoon.open, 112.0);
        assert_eq!(afternoon.close, 124.0);
    }

    #[test]
    fn excludes_today_and_keeps_latest_days() {
        let mut bars = Vec::new();
        for day in 10..=14 {
            bars.push(bar(day, 3, 100.0));
            bars.push(bar(day, 15, 100.0));
        }
        let today = NaiveDate::from_ymd_opt(2025, 10, 14).unwrap();
        let candles = aggregate_half_days(&bars, today, 2, noon());

        assert_eq!(candles.len(), 4);
        assert_eq!(candles[0].date, NaiveDate::from_ymd_opt(2025, 10, 12).unwrap());
        assert_eq!(candles[3].date, NaiveDate::from_ymd_opt(2025, 10, 13).unwrap());
    }

    #[test]
    fn skips_days_missing_a_half() {
        let bars = vec![bar(12, 3, 100.0), bar(13, 3, 100.0), bar(13, 15, 101.0)];
        let today = NaiveDate::from_ymd_opt(2025, 10, 14).unwrap();
        let candles = aggregate_half_days(&bars, today, 20, noon());
        assert_eq!(candles.len(), 2);
        assert!(candles.iter().all(|c| c.date.to_string() == "2025-10-13"));
    }

    #[test]
    fn unordered_bars_use_first_and_last_by_time() {
        let bars = vec![bar(13, 11, 200.0), bar(13, 0, 100.0), bar(13, 13, 150.0)];
        let today = NaiveDate::from_ymd_opt(2025, 10, 14).unwrap();
        let candles = aggregate_half_days(&bars, today, 20, noon());
        assert_eq!(candles[0].open, 100.0);
        assert_eq!(candles[0].close, 201.0);
    }
}
