//! In-memory simulated exchange.
//!
//! Market orders fill immediately at the quoted price, split into
//! `fills_per_order` equal trades. Sells are not checked against holdings, so a
//! fresh process can still close a position recorded by an earlier one.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use tracing::debug;

use crate::domain::error::TraderError;
use crate::domain::execution::{Fill, OrderRef, OrderState, OrderStatus};
use crate::ports::exchange_port::ExchangePort;

pub struct PaperExchange {
    quote_currency: String,
    fills_per_order: usize,
    cash: Cell<f64>,
    prices: RefCell<HashMap<String, f64>>,
    holdings: RefCell<HashMap<String, f64>>,
    orders: RefCell<HashMap<OrderRef, OrderStatus>>,
    next_id: Cell<u64>,
}

impl PaperExchange {
    pub fn new(quote_currency: &str, cash: f64, fills_per_order: usize) -> Self {
        Self {
            quote_currency: quote_currency.to_string(),
            fills_per_order: fills_per_order.max(1),
            cash: Cell::new(cash),
            prices: RefCell::new(HashMap::new()),
            holdings: RefCell::new(HashMap::new()),
            orders: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
        }
    }

    pub fn set_price(&self, instrument: &str, price: f64) {
        self.prices.borrow_mut().insert(instrument.to_string(), price);
    }

    pub fn holding(&self, instrument: &str) -> f64 {
        self.holdings.borrow().get(instrument).copied().unwrap_or(0.0)
    }

    fn price(&self, instrument: &str) -> Result<f64, TraderError> {
        self.prices
            .borrow()
            .get(instrument)
            .copied()
            .filter(|p| *p > 0.0)
            .ok_or_else(|| TraderError::exchange(format!("no quote for {instrument}")))
    }

    fn record(&self, quantity: f64, price: f64) -> OrderRef {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let order_ref = OrderRef(format!("paper-{id}"));

        let part = quantity / self.fills_per_order as f64;
        let fills = (0..self.fills_per_order)
            .map(|_| Fill {
                quantity: part,
                price,
            })
            .collect();
        self.orders.borrow_mut().insert(
            order_ref.clone(),
            OrderStatus {
                state: OrderState::Done,
                fills,
            },
        );
        order_ref
    }
}

impl ExchangePort for PaperExchange {
    fn submit_market_buy(&self, instrument: &str, notional: f64) -> Result<OrderRef, TraderError> {
        let price = self.price(instrument)?;
        let cash = self.cash.get();
        if notional > cash {
            return Err(TraderError::exchange(format!(
                "insufficient funds: {notional:.2} requested, {cash:.2} available"
            )));
        }
        let quantity = notional / price;
        self.cash.set(cash - notional);
        *self
            .holdings
            .borrow_mut()
            .entry(instrument.to_string())
            .or_insert(0.0) += quantity;
        debug!(instrument, notional, price, quantity, "paper buy filled");
        Ok(self.record(quantity, price))
    }

    fn submit_market_sell(&self, instrument: &str, quantity: f64) -> Result<OrderRef, TraderError> {
        let price = self.price(instrument)?;
        self.cash.set(self.cash.get() + quantity * price);
        let mut holdings = self.holdings.borrow_mut();
        let held = holdings.entry(instrument.to_string()).or_insert(0.0);
        *held = (*held - quantity).max(0.0);
        debug!(instrument, quantity, price, "paper sell filled");
        drop(holdings);
        Ok(self.record(quantity, price))
    }

    fn order_status(&self, order_ref: &OrderRef) -> Result<OrderStatus, TraderError> {
        self.orders
            .borrow()
            .get(order_ref)
            .cloned()
            .ok_or_else(|| TraderError::exchange(format!("unknown order {order_ref}")))
    }

    fn available_balance(&self, currency: &str) -> Result<f64, TraderError> {
        if currency == self.quote_currency {
            Ok(self.cash.get())
        } else {
            Ok(self.holding(currency))
        }
    }

    fn current_price(&self, instrument: &str) -> Result<f64, TraderError> {
        self.price(instrument)
    }
}
