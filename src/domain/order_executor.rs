//! Market order submission with bounded fill confirmation.
//!
//! An order is submitted once, then polled at a fixed interval until the
//! exchange reports a terminal state or the timeout elapses. A timeout is not a
//! failure of the order: it may still fill, so callers get
//! [`TraderError::OrderTimeout`] and must treat the outcome as unknown.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use super::error::TraderError;
use super::execution::{ExecutionResult, OrderDirection, OrderRef, OrderStatus};
use crate::ports::exchange_port::ExchangePort;
use crate::ports::notification_port::NotificationPort;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_ORDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutorConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_ORDER_TIMEOUT,
        }
    }
}

pub struct OrderExecutor<'a> {
    exchange: &'a dyn ExchangePort,
    notifier: &'a dyn NotificationPort,
    config: ExecutorConfig,
}

impl<'a> OrderExecutor<'a> {
    pub fn new(
        exchange: &'a dyn ExchangePort,
        notifier: &'a dyn NotificationPort,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            exchange,
            notifier,
            config,
        }
    }

    /// Market buy spending `notional`; rejects non-positive amounts before
    /// touching the exchange.
    pub fn buy(
        &self,
        instrument: &str,
        notional: f64,
        strategy: &str,
    ) -> Result<ExecutionResult, TraderError> {
        if !(notional > 0.0) {
            return Err(TraderError::invalid_argument(format!(
                "buy notional must be positive, got {notional}"
            )));
        }
        info!(instrument, strategy, notional, "submitting market buy");
        let order_ref = self.exchange.submit_market_buy(instrument, notional)?;
        self.settle(instrument, strategy, OrderDirection::Buy, order_ref)
    }

    /// Market sell of `quantity`; rejects non-positive quantities before
    /// touching the exchange.
    pub fn sell(
        &self,
        instrument: &str,
        quantity: f64,
        strategy: &str,
    ) -> Result<ExecutionResult, TraderError> {
        if !(quantity > 0.0) {
            return Err(TraderError::invalid_argument(format!(
                "sell quantity must be positive, got {quantity}"
            )));
        }
        info!(instrument, strategy, quantity, "submitting market sell");
        let order_ref = self.exchange.submit_market_sell(instrument, quantity)?;
        self.settle(instrument, strategy, OrderDirection::Sell, order_ref)
    }

    fn settle(
        &self,
        instrument: &str,
        strategy: &str,
        direction: OrderDirection,
        order_ref: OrderRef,
    ) -> Result<ExecutionResult, TraderError> {
        let status = self.wait_for_terminal(&order_ref)?;
        let result =
            ExecutionResult::from_fills(strategy, instrument, direction, order_ref, &status.fills);

        info!(
            instrument,
            strategy,
            %direction,
            order = %result.order_ref,
            state = ?status.state,
            quantity = result.filled_quantity,
            price = result.filled_price,
            notional = result.filled_notional,
            "order settled"
        );

        if !result.is_empty() {
            self.notifier.order_executed(&result);
        }
        Ok(result)
    }

    fn wait_for_terminal(&self, order_ref: &OrderRef) -> Result<OrderStatus, TraderError> {
        let started = Instant::now();
        loop {
            let status = self.exchange.order_status(order_ref)?;
            if status.state.is_terminal() {
                debug!(order = %order_ref, state = ?status.state, "order reached terminal state");
                return Ok(status);
            }

            let elapsed = started.elapsed();
            if elapsed >= self.config.timeout {
                error!(
                    order = %order_ref,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "timed out waiting for order confirmation"
                );
                return Err(TraderError::OrderTimeout {
                    order_ref: order_ref.to_string(),
                    elapsed,
                });
            }

            thread::sleep(self.config.poll_interval);
        }
    }
}
