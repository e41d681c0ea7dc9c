//! Order and fill types, and aggregation of fills into an execution result.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Buy,
    Sell,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Buy => write!(f, "buy"),
            OrderDirection::Sell => write!(f, "sell"),
        }
    }
}

/// Exchange-assigned order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderRef(pub String);

impl fmt::Display for OrderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Wait,
    Watch,
    Done,
    Cancel,
}

impl OrderState {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderState::Done | OrderState::Cancel)
    }
}

/// One partial fill (trade) belonging to an order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub quantity: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatus {
    pub state: OrderState,
    pub fills: Vec<Fill>,
}

/// Normalized outcome of one market order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub strategy_name: String,
    pub instrument: String,
    pub direction: OrderDirection,
    pub filled_quantity: f64,
    /// Quantity-weighted average over all fills; 0 when nothing filled.
    pub filled_price: f64,
    pub filled_notional: f64,
    pub order_ref: OrderRef,
}

impl ExecutionResult {
    pub fn from_fills(
        strategy_name: &str,
        instrument: &str,
        direction: OrderDirection,
        order_ref: OrderRef,
        fills: &[Fill],
    ) -> Self {
        let filled_quantity: f64 = fills.iter().map(|f| f.quantity).sum();
        let filled_notional: f64 = fills.iter().map(|f| f.quantity * f.price).sum();
        let filled_price = if filled_quantity > 0.0 {
            filled_notional / filled_quantity
        } else {
            0.0
        };

        ExecutionResult {
            strategy_name: strategy_name.to_string(),
            instrument: instrument.to_string(),
            direction,
            filled_quantity,
            filled_price,
            filled_notional,
            order_ref,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filled_quantity <= 0.0
    }
}
