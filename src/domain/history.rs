//! Prior-session indicators consumed by the strategies.

use super::candle::{HalfDayCandle, Period};
use super::error::TraderError;

/// Moving-average windows, in days, averaged into the trend score.
pub const MA_WINDOWS: [usize; 4] = [3, 5, 10, 20];

/// Recent half-day candles, oldest first, morning/afternoon alternating.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorHistory {
    candles: Vec<HalfDayCandle>,
}

impl IndicatorHistory {
    pub fn new(candles: Vec<HalfDayCandle>) -> Self {
        Self { candles }
    }

    pub fn candles(&self) -> &[HalfDayCandle] {
        &self.candles
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn yesterday_morning(&self) -> Result<&HalfDayCandle, TraderError> {
        self.latest(Period::Morning)
    }

    pub fn yesterday_afternoon(&self) -> Result<&HalfDayCandle, TraderError> {
        self.latest(Period::Afternoon)
    }

    fn latest(&self, period: Period) -> Result<&HalfDayCandle, TraderError> {
        self.candles
            .iter()
            .rev()
            .find(|c| c.period == period)
            .ok_or(TraderError::InsufficientData {
                have: self.candles.len(),
                need: 2,
            })
    }

    fn daily_closes(&self) -> Vec<f64> {
        self.candles
            .iter()
            .filter(|c| c.period == Period::Afternoon)
            .map(|c| c.close)
            .collect()
    }

    /// Share of moving-average windows the latest close sits above, in `[0, 1]`.
    ///
    /// Only windows covered by the available history count toward the score.
    pub fn moving_average_score(&self) -> Result<f64, TraderError> {
        let closes = self.daily_closes();
        let Some(&last) = closes.last() else {
            return Err(TraderError::InsufficientData {
                have: self.candles.len(),
                need: 2 * MA_WINDOWS[0],
            });
        };

        let usable: Vec<usize> = MA_WINDOWS
            .iter()
            .copied()
            .filter(|&n| closes.len() >= n)
            .collect();
        if usable.is_empty() {
            return Err(TraderError::InsufficientData {
                have: self.candles.len(),
                need: 2 * MA_WINDOWS[0],
            });
        }

        let above = usable
            .iter()
            .filter(|&&n| {
                let window = &closes[closes.len() - n..];
                let sma = window.iter().sum::<f64>() / n as f64;
                last > sma
            })
            .count();
        Ok(above as f64 / usable.len() as f64)
    }

    /// Mean noise ratio over morning candles that moved; 0 when none did.
    pub fn morning_noise_average(&self) -> f64 {
        let noises: Vec<f64> = self
            .candles
            .iter()
            .filter(|c| c.period == Period::Morning)
            .filter_map(HalfDayCandle::noise)
            .collect();
        if noises.is_empty() {
            return 0.0;
        }
        noises.iter().sum::<f64>() / noises.len() as f64
    }
}
