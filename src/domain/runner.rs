//! One scheduling tick over every configured strategy.

use tracing::{error, info, warn};

use super::error::TraderError;
use super::strategy::{Strategy, StrategyContext, TickOutcome};
use crate::ports::notification_port::NotificationPort;

/// Per-strategy line of a [`TickReport`].
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRun {
    pub instrument: String,
    pub strategy: String,
    pub outcome: Result<TickOutcome, String>,
    /// The failure was an order whose fill could not be confirmed.
    pub outcome_unknown: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub runs: Vec<StrategyRun>,
}

impl TickReport {
    pub fn failures(&self) -> usize {
        self.runs.iter().filter(|r| r.outcome.is_err()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.failures() == 0
    }
}

/// Run each strategy once, in order.
///
/// A failing strategy is logged and reported to `notifier`; the remaining
/// strategies still run.
pub fn run_tick(
    strategies: &[Box<dyn Strategy>],
    ctx: &StrategyContext<'_>,
    notifier: &dyn NotificationPort,
) -> TickReport {
    let mut report = TickReport::default();

    for strategy in strategies {
        let instrument = strategy.instrument();
        let name = strategy.name();

        let run = match strategy.execute(ctx) {
            Ok(outcome) => {
                info!(instrument, strategy = name, %outcome, "strategy tick complete");
                StrategyRun {
                    instrument: instrument.to_string(),
                    strategy: name.to_string(),
                    outcome: Ok(outcome),
                    outcome_unknown: false,
                }
            }
            Err(e) => {
                let unknown = e.is_outcome_unknown();
                if unknown {
                    warn!(instrument, strategy = name, error = %e, "order outcome unknown, state left as is");
                } else {
                    error!(instrument, strategy = name, error = %e, "strategy tick failed");
                }
                notifier.strategy_failed(instrument, name, &e);
                StrategyRun {
                    instrument: instrument.to_string(),
                    strategy: name.to_string(),
                    outcome: Err(e.to_string()),
                    outcome_unknown: unknown,
                }
            }
        };
        report.runs.push(run);
    }

    report
}

/// Equal share of `total - reserved` for each instrument.
pub fn allocate_capital(total: f64, reserved: f64, instrument_count: usize) -> Result<f64, TraderError> {
    if instrument_count == 0 {
        return Err(TraderError::invalid_argument("no instruments to allocate capital to"));
    }
    let available = total - reserved;
    if !(available > 0.0) {
        return Err(TraderError::invalid_argument(format!(
            "balance {total} does not exceed reserve {reserved}"
        )));
    }
    Ok(available / instrument_count as f64)
}
