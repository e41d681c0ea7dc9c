//! Morning/afternoon: if yesterday's afternoon rose on heavier volume than its
//! morning, buy at the start of today's morning and sell at the afternoon.

use tracing::{debug, info, warn};

use super::{buy_and_record, exit_position, Strategy, StrategyConfig, StrategyContext, TickOutcome};
use crate::domain::candle::HalfDayCandle;
use crate::domain::error::TraderError;
use crate::domain::state::{phase_of, DailyParams, PositionPhase, StrategyState};

pub(super) const NAME: &str = "morning_afternoon";

/// `target / max(volatility, floor)`, uncapped; the allocation cap applies at
/// buy time.
pub fn position_size(target: f64, volatility: f64, floor: f64) -> f64 {
    target / volatility.max(floor)
}

pub fn entry_signal(morning: &HalfDayCandle, afternoon: &HalfDayCandle) -> bool {
    afternoon.return_rate() > 0.0 && morning.volume < afternoon.volume
}

pub struct MorningAfternoon {
    instrument: String,
    config: StrategyConfig,
}

impl MorningAfternoon {
    pub fn new(instrument: &str, config: StrategyConfig) -> Self {
        Self {
            instrument: instrument.to_string(),
            config,
        }
    }

    fn enter(&self, ctx: &StrategyContext<'_>) -> Result<TickOutcome, TraderError> {
        let today = ctx.clock.today();
        let prior = ctx.store.load(&self.instrument, NAME);

        // A record for today means the first morning tick already ran.
        match phase_of(prior.as_ref(), today) {
            PositionPhase::Held => return Ok(TickOutcome::AlreadyHeld),
            PositionPhase::Computed => {
                debug!(instrument = %self.instrument, "already evaluated this morning");
                return Ok(TickOutcome::NoSignal);
            }
            PositionPhase::Flat => {}
        }

        let history = ctx.collector.collect(&self.instrument)?;
        let morning = history.yesterday_morning()?;
        let afternoon = history.yesterday_afternoon()?;

        let size = position_size(
            self.config.target_volatility,
            morning.volatility(),
            self.config.volatility_floor,
        );
        let params = DailyParams {
            position_size: Some(size),
            breakout_threshold: None,
        };
        ctx.store
            .save(&self.instrument, NAME, &StrategyState::computed(today, params))?;

        let signal = entry_signal(morning, afternoon);
        info!(
            instrument = %self.instrument,
            afternoon_return = afternoon.return_rate(),
            morning_volume = morning.volume,
            afternoon_volume = afternoon.volume,
            position_size = size,
            signal,
            "evaluated morning entry"
        );
        if !signal || size <= 0.0 {
            return Ok(TickOutcome::NoSignal);
        }

        let outcome = buy_and_record(self, &self.config, ctx, today, params);
        let retry = match &outcome {
            Ok(TickOutcome::EmptyFill { .. }) => true,
            Err(e) => !e.is_outcome_unknown(),
            Ok(_) => false,
        };
        if retry {
            self.restore(ctx, prior.as_ref());
        }
        outcome
    }

    /// Put back the record seen before this tick so the next morning tick
    /// evaluates the entry again. An unknown order outcome keeps `Computed`.
    fn restore(&self, ctx: &StrategyContext<'_>, prior: Option<&StrategyState>) {
        let restored = match prior {
            Some(state) => ctx.store.save(&self.instrument, NAME, state),
            None => ctx.store.delete(&self.instrument, NAME),
        };
        match restored {
            Ok(()) => debug!(instrument = %self.instrument, "entry not filled, will retry next tick"),
            Err(e) => warn!(instrument = %self.instrument, error = %e, "failed to reset state after entry failure"),
        }
    }
}

impl Strategy for MorningAfternoon {
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
