//! Concrete adapter implementations for ports.

pub mod csv_collector;
pub mod csv_trade_journal;
pub mod file_config_adapter;
pub mod file_state_store;
pub mod log_notifier;
pub mod paper_exchange;
#[cfg(feature = "sqlite")]
pub mod sqlite_state_store;
