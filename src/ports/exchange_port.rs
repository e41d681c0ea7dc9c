//! Exchange client port.
//!
//! Implementations surface network and auth failures as
//! [`TraderError::Exchange`] and own any retry policy for transient errors.

use crate::domain::error::TraderError;
use crate::domain::execution::{OrderRef, OrderStatus};

pub trait ExchangePort {
    /// Market buy spending `notional` of the quote currency.
    fn submit_market_buy(&self, instrument: &str, notional: f64) -> Result<OrderRef, TraderError>;

    /// Market sell of `quantity` units.
    fn submit_market_sell(&self, instrument: &str, quantity: f64)
    -> Result<OrderRef, TraderError>;

    fn order_status(&self, order_ref: &OrderRef) -> Result<OrderStatus, TraderError>;

    fn available_balance(&self, currency: &str) -> Result<f64, TraderError>;

    fn current_price(&self, instrument: &str) -> Result<f64, TraderError>;
}
