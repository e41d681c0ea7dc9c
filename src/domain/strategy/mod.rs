//! Strategy state machines run once per scheduling tick.
//!
//! Every strategy follows the same daily cycle over the persisted
//! [`StrategyState`]:
//!
//! * morning session (entry window): compute today's parameters once, cache
//!   them as `Computed`, then buy when the entry predicate holds and record the
//!   filled quantity as `Held`;
//! * afternoon session (exit window): sell whatever is `Held`, lowering or
//!   deleting the record according to the fill.
//!
//! Strategies never touch storage directly; they go through
//! [`StateStorePort`] in the [`StrategyContext`].

mod morning_afternoon;
mod volatility_breakout;

pub use morning_afternoon::MorningAfternoon;
pub use volatility_breakout::{breakout_threshold, position_size, VolatilityBreakout};

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::error::TraderError;
use super::execution::{ExecutionResult, OrderDirection};
use super::order_executor::OrderExecutor;
use super::state::{DailyParams, StrategyState};
use crate::ports::data_port::DataPort;
use crate::ports::exchange_port::ExchangePort;
use crate::ports::state_port::StateStorePort;

/// Relative tolerance under which a sell is treated as having closed the
/// recorded quantity.
const FULL_FILL_TOLERANCE: f64 = 1e-9;

pub const DEFAULT_TARGET_VOLATILITY: f64 = 0.01;
pub const DEFAULT_VOLATILITY_FLOOR: f64 = 0.01;
pub const DEFAULT_MIN_ORDER_AMOUNT: f64 = 5000.0;

/// What one invocation of a strategy did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Entered(ExecutionResult),
    Exited {
        result: ExecutionResult,
        remaining: f64,
    },
    /// The order reached a terminal state without any fill; state unchanged.
    EmptyFill { direction: OrderDirection },
    AlreadyHeld,
    NoSignal,
    Flat,
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickOutcome::Entered(r) => write!(
                f,
                "bought {:.8} @ {:.2} ({:.0} notional)",
                r.filled_quantity, r.filled_price, r.filled_notional
            ),
            TickOutcome::Exited { result, remaining } => write!(
                f,
                "sold {:.8} @ {:.2}, {:.8} remaining",
                result.filled_quantity, result.filled_price, remaining
            ),
            TickOutcome::EmptyFill { direction } => write!(f, "{direction} order filled nothing"),
            TickOutcome::AlreadyHeld => write!(f, "already holding"),
            TickOutcome::NoSignal => write!(f, "no signal"),
            TickOutcome::Flat => write!(f, "flat"),
        }
    }
}

/// Collaborators a strategy needs for one tick.
pub struct StrategyContext<'a> {
    pub clock: &'a dyn Clock,
    pub collector: &'a dyn DataPort,
    pub store: &'a dyn StateStorePort,
    pub market: &'a dyn ExchangePort,
    pub executor: &'a OrderExecutor<'a>,
}

/// Sizing and capital inputs shared by both strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub target_volatility: f64,
    pub volatility_floor: f64,
    pub total_capital: f64,
    /// Per-instrument cap on a single buy.
    pub allocated_capital: f64,
    pub min_order_amount: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            target_volatility: DEFAULT_TARGET_VOLATILITY,
            volatility_floor: DEFAULT_VOLATILITY_FLOOR,
            total_capital: 0.0,
            allocated_capital: 0.0,
            min_order_amount: DEFAULT_MIN_ORDER_AMOUNT,
        }
    }
}

impl StrategyConfig {
    pub fn buy_notional(&self, position_size: f64) -> f64 {
        (self.total_capital * position_size).min(self.allocated_capital)
    }
}

pub trait Strategy {
    /// Stable name used as the state-store key.
    fn name(&self) -> &'static str;
    fn instrument(&self) -> &str;
    fn execute(&self, ctx: &StrategyContext<'_>) -> Result<TickOutcome, TraderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    VolatilityBreakout,
    MorningAfternoon,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 2] = [StrategyKind::VolatilityBreakout, StrategyKind::MorningAfternoon];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::VolatilityBreakout => volatility_breakout::NAME,
            StrategyKind::MorningAfternoon => morning_afternoon::NAME,
        }
    }

    pub fn build(self, instrument: &str, config: StrategyConfig) -> Box<dyn Strategy> {
        match self {
            StrategyKind::VolatilityBreakout => Box::new(VolatilityBreakout::new(instrument, config)),
            StrategyKind::MorningAfternoon => Box::new(MorningAfternoon::new(instrument, config)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = TraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "volatility" | "volatility_breakout" => Ok(StrategyKind::VolatilityBreakout),
            "morning_afternoon" => Ok(StrategyKind::MorningAfternoon),
            other => Err(TraderError::invalid_argument(format!(
                "unknown strategy '{other}' (expected volatility or morning_afternoon)"
            ))),
        }
    }
}

/// Buy for today's cached parameters and record the fill as `Held`.
///
/// Skips the order when the notional falls under the exchange minimum. An
/// empty fill leaves the stored record as it was.
fn buy_and_record(
    strategy: &dyn Strategy,
    config: &StrategyConfig,
    ctx: &StrategyContext<'_>,
    today: NaiveDate,
    params: DailyParams,
) -> Result<TickOutcome, TraderError> {
    let name = strategy.name();
    let instrument = strategy.instrument();
    let size = params.position_size.unwrap_or(0.0);
    let notional = config.buy_notional(size);

    if notional < config.min_order_amount {
        info!(
            instrument,
            strategy = name,
            notional,
            min = config.min_order_amount,
            "buy amount below minimum order, skipping"
        );
        return Ok(TickOutcome::NoSignal);
    }

    let result = ctx.executor.buy(instrument, notional, name)?;
    if result.is_empty() {
        warn!(instrument, strategy = name, order = %result.order_ref, "buy filled nothing");
        return Ok(TickOutcome::EmptyFill {
            direction: OrderDirection::Buy,
        });
    }

    let held = StrategyState::held(today, result.filled_quantity, params);
    ctx.store.save(instrument, name, &held)?;
    Ok(TickOutcome::Entered(result))
}

/// Exit-window transition shared by all strategies.
///
/// Sells the quantity held today. A full fill deletes the record, a partial
/// fill stores the (never larger) remainder, and an empty fill changes nothing
/// so the next tick retries.
fn exit_position(
    strategy: &dyn Strategy,
    ctx: &StrategyContext<'_>,
) -> Result<TickOutcome, TraderError> {
    let name = strategy.name();
    let instrument = strategy.instrument();
    let today = ctx.clock.today();

    let Some(state) = ctx
        .store
        .load(instrument, name)
        .filter(|s| s.has_position(today))
    else {
        debug!(instrument, strategy = name, "nothing held, exit is a no-op");
        return Ok(TickOutcome::Flat);
    };

    let held = state.executed_quantity;
    let result = ctx.executor.sell(instrument, held, name)?;
    if result.is_empty() {
        warn!(instrument, strategy = name, order = %result.order_ref, "sell filled nothing");
        return Ok(TickOutcome::EmptyFill {
            direction: OrderDirection::Sell,
        });
    }

    let remaining = held - result.filled_quantity;
    if remaining <= held * FULL_FILL_TOLERANCE {
        ctx.store.delete(instrument, name)?;
        info!(instrument, strategy = name, "position closed");
        return Ok(TickOutcome::Exited {
            result,
            remaining: 0.0,
        });
    }

    let reduced = state.with_remaining(remaining);
    ctx.store.save(instrument, name, &reduced)?;
    info!(
        instrument,
        strategy = name,
        remaining = reduced.executed_quantity,
        "partial sell, remainder kept for next tick"
    );
    Ok(TickOutcome::Exited {
        result,
        remaining: reduced.executed_quantity,
    })
}
