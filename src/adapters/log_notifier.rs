//! Notification sinks that only log, plus a fan-out combinator.

use tracing::{error, info};

use crate::domain::error::TraderError;
use crate::domain::execution::ExecutionResult;
use crate::ports::notification_port::NotificationPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationPort for LogNotifier {
    fn order_executed(&self, result: &ExecutionResult) {
        info!(
            target: "sessiontrader::notify",
            instrument = %result.instrument,
            strategy = %result.strategy_name,
            direction = %result.direction,
            quantity = result.filled_quantity,
            price = result.filled_price,
            notional = result.filled_notional,
            order = %result.order_ref,
            "order executed"
        );
    }

    fn strategy_failed(&self, instrument: &str, strategy: &str, err: &TraderError) {
        error!(
            target: "sessiontrader::notify",
            instrument,
            strategy,
            error = %err,
            outcome_unknown = err.is_outcome_unknown(),
            "strategy failed"
        );
    }
}

/// Forwards every notification to each inner sink in order.
#[derive(Default)]
pub struct FanoutNotifier {
    sinks: Vec<Box<dyn NotificationPort>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Box<dyn NotificationPort>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl NotificationPort for FanoutNotifier {
    fn order_executed(&self, result: &ExecutionResult) {
        for sink in &self.sinks {
            sink.order_executed(result);
        }
    }

    fn strategy_failed(&self, instrument: &str, strategy: &str, err: &TraderError) {
        for sink in &self.sinks {
            sink.strategy_failed(instrument, strategy, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::{OrderDirection, OrderRef};
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counter {
        orders: Rc<Cell<usize>>,
        failures: Rc<Cell<usize>>,
    }

    impl NotificationPort for Counter {
        fn order_executed(&self, _: &ExecutionResult) {
            self.orders.set(self.orders.get() + 1);
        }

        fn strategy_failed(&self, _: &str, _: &str, _: &TraderError) {
            self.failures.set(self.failures.get() + 1);
        }
    }

    #[test]
    fn fanout_reaches_every_sink() {
        let orders = Rc::new(Cell::new(0));
        let failures = Rc::new(Cell::new(0));
        let counter = || {
            Box::new(Counter {
                orders: Rc::clone(&orders),
                failures: Rc::clone(&failures),
            })
        };
        let fanout = FanoutNotifier::new()
            .with(Box::new(LogNotifier))
            .with(counter())
            .with(counter());
        assert_eq!(fanout.len(), 3);

        let result = ExecutionResult::from_fills(
            "volatility",
            "KRW-BTC",
            OrderDirection::Buy,
            OrderRef("x".into()),
            &[],
        );
        fanout.order_executed(&result);
        fanout.strategy_failed("KRW-BTC", "volatility", &TraderError::exchange("down"));

        assert_eq!(orders.get(), 2);
        assert_eq!(failures.get(), 2);
    }
}
