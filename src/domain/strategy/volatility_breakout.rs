//! Volatility breakout: buy in the morning once price clears yesterday's
//! close plus a noise-scaled share of yesterday's morning range.

use tracing::{debug, info};

use super::{buy_and_record, exit_position, Strategy, StrategyConfig, StrategyContext, TickOutcome};
use crate::domain::error::TraderError;
use crate::domain::state::{DailyParams, StrategyState};

pub(super) const NAME: &str = "volatility";

/// `clamp(target / max(volatility, floor), 0, 1) * ma_score`.
pub fn position_size(target: f64, volatility: f64, floor: f64, ma_score: f64) -> f64 {
    (target / volatility.max(floor)).clamp(0.0, 1.0) * ma_score
}

/// Today's open (yesterday's afternoon close) plus `k` times yesterday's
/// morning range.
pub fn breakout_threshold(afternoon_close: f64, morning_range: f64, k: f64) -> f64 {
    afternoon_close + morning_range * k
}

pub struct VolatilityBreakout {
    instrument: String,
    config: StrategyConfig,
}

impl VolatilityBreakout {
    pub fn new(instrument: &str, config: StrategyConfig) -> Self {
        Self {
            instrument: instrument.to_string(),
            config,
        }
    }

    fn compute_params(&self, ctx: &StrategyContext<'_>) -> Result<DailyParams, TraderError> {
        let history = ctx.collector.collect(&self.instrument)?;
        let morning = history.yesterday_morning()?;
        let afternoon = history.yesterday_afternoon()?;
        let ma_score = history.moving_average_score()?;
        let k = history.morning_noise_average();

        let size = position_size(
            self.config.target_volatility,
            morning.volatility(),
            self.config.volatility_floor,
            ma_score,
        );
        let threshold = breakout_threshold(afternoon.close, morning.range(), k);

        info!(
            instrument = %self.instrument,
            volatility = morning.volatility(),
            ma_score,
            k,
            position_size = size,
            threshold,
            "computed breakout parameters"
        );
        Ok(DailyParams {
            position_size: Some(size),
            breakout_threshold: Some(threshold),
        })
    }

    fn enter(&self, ctx: &StrategyContext<'_>) -> Result<TickOutcome, TraderError> {
        let today = ctx.clock.today();
        let stored = ctx
            .store
            .load(&self.instrument, NAME)
            .filter(|s| s.is_for(today));

        if stored.as_ref().is_some_and(|s| s.has_position(today)) {
            debug!(instrument = %self.instrument, "already bought today");
            return Ok(TickOutcome::AlreadyHeld);
        }

        // Cached values are reused for the rest of the day.
        let params = match stored.map(|s| s.params()) {
            Some(p) if p.position_size.is_some() && p.breakout_threshold.is_some() => p,
            _ => {
                let params = self.compute_params(ctx)?;
                ctx.store
                    .save(&self.instrument, NAME, &StrategyState::computed(today, params))?;
                params
            }
        };

        let (Some(size), Some(threshold)) = (params.position_size, params.breakout_threshold) else {
            return Ok(TickOutcome::NoSignal);
        };
        if size <= 0.0 {
            debug!(instrument = %self.instrument, size, "entry disabled for today");
            return Ok(TickOutcome::NoSignal);
        }

        let price = ctx.market.current_price(&self.instrument)?;
        if price <= threshold {
            debug!(instrument = %self.instrument, price, threshold, "no breakout");
            return Ok(TickOutcome::NoSignal);
        }

        info!(instrument = %self.instrument, price, threshold, "breakout, buying");
        buy_and_record(self, &self.config, ctx, today, params)
    }
}

impl Strategy for VolatilityBreakout {
    fn name(&self) -> &'static str {
        NAME
    }

    fn instrument(&self) -> &str {
        &self.instrument
    }

    fn execute(&self, ctx: &StrategyContext<'_>) -> Result<TickOutcome, TraderError> {
        if ctx.clock.is_morning_session() {
            self.enter(ctx)
        } else {
            exit_position(self, ctx)
        }
    }
}
