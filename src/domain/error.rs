//! Domain error types.
//!
//! Callers match on the variant to decide recoverability: `InvalidArgument` is
//! fatal to the single call, `OrderTimeout` means the order outcome is unknown,
//! and everything else is an ordinary failure of one strategy run.

use std::time::Duration;

/// Top-level error type for sessiontrader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("order {order_ref} not confirmed after {:.1}s", .elapsed.as_secs_f64())]
    OrderTimeout { order_ref: String, elapsed: Duration },

    #[error("exchange error: {reason}")]
    Exchange { reason: String },

    #[error("no data for {instrument}")]
    NoData { instrument: String },

    #[error("bad market data in {file}: {reason}")]
    DataParse { file: String, reason: String },

    #[error("insufficient data: have {have} half-day candles, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("state store error: {reason}")]
    StateStore { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        TraderError::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn exchange(reason: impl Into<String>) -> Self {
        TraderError::Exchange {
            reason: reason.into(),
        }
    }

    /// True when an order may still fill asynchronously even though the call failed.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, TraderError::OrderTimeout { .. })
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. } => 2,
            TraderError::StateStore { .. } => 3,
            TraderError::InvalidArgument { .. } => 4,
            TraderError::NoData { .. }
            | TraderError::DataParse { .. }
            | TraderError::InsufficientData { .. } => 5,
            TraderError::Exchange { .. } => 6,
            TraderError::OrderTimeout { .. } => 7,
        };
        std::process::ExitCode::from(code)
    }
}
