//! Strategy state store port.

use crate::domain::error::TraderError;
use crate::domain::state::StrategyState;

/// Durable record per `(instrument, strategy)`.
///
/// `load` is fail-soft: a missing, unreadable or corrupt record is `None`,
/// which only makes the strategy recompute. `save` overwrites the whole record.
/// `delete` succeeds when nothing is stored.
pub trait StateStorePort {
    fn load(&self, instrument: &str, strategy: &str) -> Option<StrategyState>;
    fn save(&self, instrument: &str, strategy: &str, state: &StrategyState)
    -> Result<(), TraderError>;
    fn delete(&self, instrument: &str, strategy: &str) -> Result<(), TraderError>;
}
