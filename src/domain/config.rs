//! Typed trader configuration built from a [`ConfigPort`].

use std::path::PathBuf;
use std::time::Duration;

use chrono::{FixedOffset, NaiveTime};

use super::clock::{session_split_at, utc_offset};
use super::config_validation::validate_trader_config;
use super::error::TraderError;
use super::order_executor::ExecutorConfig;
use super::strategy::{StrategyConfig, StrategyKind};
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub enum StateBackend {
    File { dir: PathBuf },
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaperConfig {
    pub cash: f64,
    pub fills_per_order: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraderConfig {
    pub instruments: Vec<String>,
    pub strategies: Vec<StrategyKind>,
    pub quote_currency: String,
    pub reserved_capital: f64,
    pub offset: FixedOffset,
    pub session_split: NaiveTime,
    pub target_volatility: f64,
    pub volatility_floor: f64,
    pub min_order_amount: f64,
    pub executor: ExecutorConfig,
    pub state: StateBackend,
    pub data_dir: PathBuf,
    pub history_days: usize,
    pub paper: PaperConfig,
    pub journal_path: Option<PathBuf>,
}

impl TraderConfig {
    /// Validate, then read every section into typed fields.
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, TraderError> {
        validate_trader_config(config)?;

        let mut strategies = Vec::new();
        for name in config.get_list("trading", "strategies") {
            let kind = name.parse::<StrategyKind>()?;
            if !strategies.contains(&kind) {
                strategies.push(kind);
            }
        }
        if strategies.is_empty() {
            strategies = StrategyKind::ALL.to_vec();
        }

        let state = match config
            .get_string("state", "backend")
            .map(|b| b.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("sqlite") => StateBackend::Sqlite {
                path: path_or(config, "state", "sqlite_path", "state.db"),
            },
            _ => StateBackend::File {
                dir: path_or(config, "state", "dir", ".cache"),
            },
        };

        Ok(TraderConfig {
            instruments: config.get_list("trading", "instruments"),
            strategies,
            quote_currency: config
                .get_string("trading", "quote_currency")
                .unwrap_or_else(|| "KRW".to_string()),
            reserved_capital: config.get_double("trading", "reserved_capital", 50.0),
            offset: utc_offset(config.get_int("trading", "utc_offset_hours", 9) as i32),
            session_split: session_split_at(config.get_int("trading", "session_split_hour", 12) as u32),
            target_volatility: config.get_double("strategy", "target_volatility", 0.01),
            volatility_floor: config.get_double("strategy", "volatility_floor", 0.01),
            min_order_amount: config.get_double("strategy", "min_order_amount", 5000.0),
            executor: ExecutorConfig {
                poll_interval: Duration::from_millis(
                    config.get_int("executor", "poll_interval_ms", 500) as u64,
                ),
                timeout: Duration::from_secs_f64(config.get_double("executor", "timeout_secs", 30.0)),
            },
            state,
            data_dir: path_or(config, "data", "dir", "data"),
            history_days: config.get_int("data", "history_days", 20) as usize,
            paper: PaperConfig {
                cash: config.get_double("paper", "cash", 1_000_000.0),
                fills_per_order: config.get_int("paper", "fills_per_order", 1) as usize,
            },
            journal_path: config.get_string("journal", "path").map(PathBuf::from),
        })
    }

    /// Strategy settings for one instrument given its capital allocation.
    pub fn strategy_config(&self, total_capital: f64, allocated_capital: f64) -> StrategyConfig {
        StrategyConfig {
            target_volatility: self.target_volatility,
            volatility_floor: self.volatility_floor,
            total_capital,
            allocated_capital,
            min_order_amount: self.min_order_amount,
        }
    }
}

fn path_or(config: &dyn ConfigPort, section: &str, key: &str, default: &str) -> PathBuf {
    config
        .get_string(section, key)
        .filter(|s| !s.trim().is_empty())
        .map_or_else(|| PathBuf::from(default), PathBuf::from)
}
