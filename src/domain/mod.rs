//! Core domain types and logic.

pub mod candle;
pub mod clock;
pub mod config;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod history;
pub mod order_executor;
pub mod runner;
pub mod state;
pub mod strategy;
