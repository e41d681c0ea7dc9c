//! Configuration validation.
//!
//! Checks every INI field the trader reads before any strategy runs.

use crate::domain::error::TraderError;
use crate::domain::strategy::StrategyKind;
use crate::ports::config_port::ConfigPort;

pub const MIN_TARGET_VOLATILITY: f64 = 0.005;
pub const MAX_TARGET_VOLATILITY: f64 = 0.02;

pub fn validate_trader_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_instruments(config)?;
    validate_strategies(config)?;
    validate_session(config)?;
    validate_reserved_capital(config)?;
    validate_target_volatility(config)?;
    validate_volatility_floor(config)?;
    validate_min_order_amount(config)?;
    validate_executor(config)?;
    validate_state_backend(config)?;
    validate_history_days(config)?;
    validate_paper(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_instruments(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if config.get_list("trading", "instruments").is_empty() {
        return Err(TraderError::ConfigMissing {
            section: "trading".to_string(),
            key: "instruments".to_string(),
        });
    }
    Ok(())
}

fn validate_strategies(config: &dyn ConfigPort) -> Result<(), TraderError> {
    for name in config.get_list("trading", "strategies") {
        if name.parse::<StrategyKind>().is_err() {
            return Err(TraderError::ConfigInvalid {
                section: "trading".to_string(),
                key: "strategies".to_string(),
                reason: format!("unknown strategy '{name}'"),
            });
        }
    }
    Ok(())
}

fn validate_session(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let offset = config.get_int("trading", "utc_offset_hours", 9);
    if !(-12..=14).contains(&offset) {
        return Err(invalid(
            "trading",
            "utc_offset_hours",
            "utc_offset_hours must be between -12 and 14",
        ));
    }
    let split = config.get_int("trading", "session_split_hour", 12);
    if !(1..=23).contains(&split) {
        return Err(invalid(
            "trading",
            "session_split_hour",
            "session_split_hour must be between 1 and 23",
        ));
    }
    Ok(())
}

fn validate_reserved_capital(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if !non_negative(config.get_double("trading", "reserved_capital", 0.0)) {
        return Err(invalid(
            "trading",
            "reserved_capital",
            "reserved_capital must be non-negative",
        ));
    }
    Ok(())
}

fn validate_target_volatility(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let value = config.get_double("strategy", "target_volatility", 0.01);
    if !(MIN_TARGET_VOLATILITY..=MAX_TARGET_VOLATILITY).contains(&value) {
        return Err(invalid(
            "strategy",
            "target_volatility",
            "target_volatility must be between 0.005 and 0.02",
        ));
    }
    Ok(())
}

fn validate_volatility_floor(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if !positive(config.get_double("strategy", "volatility_floor", 0.01)) {
        return Err(invalid(
            "strategy",
            "volatility_floor",
            "volatility_floor must be positive",
        ));
    }
    Ok(())
}

fn validate_min_order_amount(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if !non_negative(config.get_double("strategy", "min_order_amount", 5000.0)) {
        return Err(invalid(
            "strategy",
            "min_order_amount",
            "min_order_amount must be non-negative",
        ));
    }
    Ok(())
}

/// Finite and `> 0`; rejects the `nan` and `inf` that `f64` parsing accepts.
fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn validate_executor(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if config.get_int("executor", "poll_interval_ms", 500) <= 0 {
        return Err(invalid(
            "executor",
            "poll_interval_ms",
            "poll_interval_ms must be positive",
        ));
    }
    if !positive(config.get_double("executor", "timeout_secs", 30.0)) {
        return Err(invalid(
            "executor",
            "timeout_secs",
            "timeout_secs must be a positive finite number",
        ));
    }
    Ok(())
}

fn validate_state_backend(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let backend = config
        .get_string("state", "backend")
        .unwrap_or_else(|| "file".to_string());
    match backend.trim().to_ascii_lowercase().as_str() {
        "file" => Ok(()),
        "sqlite" if cfg!(feature = "sqlite") => Ok(()),
        "sqlite" => Err(invalid(
            "state",
            "backend",
            "sqlite backend requires the sqlite feature",
        )),
        _ => Err(invalid("state", "backend", "backend must be file or sqlite")),
    }
}

fn validate_history_days(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if config.get_int("data", "history_days", 20) < 3 {
        return Err(invalid(
            "data",
            "history_days",
            "history_days must be at least 3",
        ));
    }
    Ok(())
}

fn validate_paper(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if !non_negative(config.get_double("paper", "cash", 0.0)) {
        return Err(invalid("paper", "cash", "cash must be non-negative"));
    }
    if config.get_int("paper", "fills_per_order", 1) < 1 {
        return Err(invalid(
            "paper",
            "fills_per_order",
            "fills_per_order must be at least 1",
        ));
    }
    Ok(())
}
