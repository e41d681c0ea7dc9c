//! Notification sink port. Fire-and-forget: implementations swallow their own
//! delivery failures so a strategy run is never aborted by a notifier.

use crate::domain::error::TraderError;
use crate::domain::execution::ExecutionResult;

pub trait NotificationPort {
    fn order_executed(&self, result: &ExecutionResult);
    fn strategy_failed(&self, instrument: &str, strategy: &str, error: &TraderError);
}
