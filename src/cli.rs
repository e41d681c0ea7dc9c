//! CLI definition and dispatch.

use chrono::DateTime;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_collector::CsvCollector;
use crate::adapters::csv_trade_journal::CsvTradeJournal;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_state_store::FileStateStore;
use crate::adapters::log_notifier::{FanoutNotifier, LogNotifier};
use crate::adapters::paper_exchange::PaperExchange;
use crate::domain::clock::{Clock, FixedClock, SystemClock};
use crate::domain::config::{StateBackend, TraderConfig};
use crate::domain::error::TraderError;
use crate::domain::order_executor::OrderExecutor;
use crate::domain::runner::{allocate_capital, run_tick, TickReport};
use crate::domain::strategy::{Strategy, StrategyContext, StrategyKind};
use crate::ports::exchange_port::ExchangePort;
use crate::ports::state_port::StateStorePort;

#[derive(Parser, Debug)]
#[command(name = "sessiontrader", about = "Session-based crypto strategy runner")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one scheduling tick against the paper exchange
    Tick {
        #[arg(short, long)]
        config: PathBuf,
        /// Only run this instrument
        #[arg(long)]
        instrument: Option<String>,
        /// Only run this strategy
        #[arg(long)]
        strategy: Option<String>,
        /// Evaluate as if the wall clock read this RFC 3339 instant
        #[arg(long)]
        at: Option<String>,
    },
    /// Validate a trader configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the stored state for one instrument and strategy
    ShowState {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        instrument: String,
        #[arg(long)]
        strategy: String,
    },
    /// Delete the stored state for one instrument and strategy
    ClearState {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        instrument: String,
        #[arg(long)]
        strategy: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Tick {
            config,
            instrument,
            strategy,
            at,
        } => run_tick_command(&config, instrument.as_deref(), strategy.as_deref(), at.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ShowState {
            config,
            instrument,
            strategy,
        } => run_show_state(&config, &instrument, &strategy),
        Command::ClearState {
            config,
            instrument,
            strategy,
        } => run_clear_state(&config, &instrument, &strategy),
    }
}

fn fail(err: &TraderError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &PathBuf) -> Result<TraderConfig, TraderError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    TraderConfig::from_port(&adapter)
}

pub fn open_state_store(config: &TraderConfig) -> Result<Box<dyn StateStorePort>, TraderError> {
    match &config.state {
        StateBackend::File { dir } => Ok(Box::new(FileStateStore::new(dir))),
        #[cfg(feature = "sqlite")]
        StateBackend::Sqlite { path } => Ok(Box::new(
            crate::adapters::sqlite_state_store::SqliteStateStore::open(path)?,
        )),
        #[cfg(not(feature = "sqlite"))]
        StateBackend::Sqlite { .. } => Err(TraderError::ConfigInvalid {
            section: "state".into(),
            key: "backend".into(),
            reason: "sqlite backend requires the sqlite feature".into(),
        }),
    }
}

fn build_clock(config: &TraderConfig, at: Option<&str>) -> Result<Box<dyn Clock>, TraderError> {
    match at {
        None => Ok(Box::new(SystemClock::new(config.offset, config.session_split))),
        Some(raw) => {
            let instant = DateTime::parse_from_rfc3339(raw).map_err(|e| {
                TraderError::invalid_argument(format!("--at '{raw}' is not RFC 3339: {e}"))
            })?;
            Ok(Box::new(
                FixedClock::new(instant.with_timezone(&config.offset)).with_split(config.session_split),
            ))
        }
    }
}

fn run_tick_command(
    config_path: &PathBuf,
    instrument: Option<&str>,
    strategy: Option<&str>,
    at: Option<&str>,
) -> ExitCode {
    match execute_tick(config_path, instrument, strategy, at) {
        Ok(report) => {
            for run in &report.runs {
                match &run.outcome {
                    Ok(outcome) => println!("{} {}: {}", run.instrument, run.strategy, outcome),
                    Err(e) if run.outcome_unknown => {
                        println!("{} {}: outcome unknown: {}", run.instrument, run.strategy, e)
                    }
                    Err(e) => println!("{} {}: failed: {}", run.instrument, run.strategy, e),
                }
            }
            if report.runs.iter().any(|r| r.outcome_unknown) {
                ExitCode::from(7)
            } else if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => fail(&e),
    }
}

pub fn execute_tick(
    config_path: &PathBuf,
    instrument_filter: Option<&str>,
    strategy_filter: Option<&str>,
    at: Option<&str>,
) -> Result<TickReport, TraderError> {
    let config = load_config(config_path)?;

    let instruments: Vec<String> = match instrument_filter {
        Some(only) => vec![only.to_string()],
        None => config.instruments.clone(),
    };
    let kinds: Vec<StrategyKind> = match strategy_filter {
        Some(only) => vec![only.parse()?],
        None => config.strategies.clone(),
    };

    let clock = build_clock(&config, at)?;
    let collector = CsvCollector::new(&config.data_dir, config.history_days, clock.as_ref());

    let exchange = PaperExchange::new(
        &config.quote_currency,
        config.paper.cash,
        config.paper.fills_per_order,
    );
    for instrument in &instruments {
        match collector.latest_close(instrument) {
            Ok(price) => exchange.set_price(instrument, price),
            Err(e) => warn!(instrument = %instrument, error = %e, "no quote available"),
        }
    }

    let mut notifier = FanoutNotifier::new().with(Box::new(LogNotifier));
    if let Some(path) = &config.journal_path {
        notifier = notifier.with(Box::new(CsvTradeJournal::new(path, config.offset)));
    }

    let store = open_state_store(&config)?;
    let total = exchange.available_balance(&config.quote_currency)?;
    let allocated = allocate_capital(total, config.reserved_capital, config.instruments.len())?;
    info!(
        total,
        allocated,
        instruments = instruments.len(),
        morning = clock.is_morning_session(),
        "starting tick"
    );

    let mut strategies: Vec<Box<dyn Strategy>> = Vec::new();
    for instrument in &instruments {
        for kind in &kinds {
            strategies.push(kind.build(instrument, config.strategy_config(total, allocated)));
        }
    }

    let executor = OrderExecutor::new(&exchange, &notifier, config.executor);
    let ctx = StrategyContext {
        clock: clock.as_ref(),
        collector: &collector,
        store: store.as_ref(),
        market: &exchange,
        executor: &executor,
    };

    Ok(run_tick(&strategies, &ctx, &notifier))
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid");
            println!("  instruments: {}", config.instruments.join(", "));
            let names: Vec<&str> = config.strategies.iter().map(|k| k.name()).collect();
            println!("  strategies:  {}", names.join(", "));
            println!("  session split: {}", config.session_split.format("%H:%M"));
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_show_state(config_path: &PathBuf, instrument: &str, strategy: &str) -> ExitCode {
    let result = load_config(config_path).and_then(|config| {
        let kind: StrategyKind = strategy.parse()?;
        let store = open_state_store(&config)?;
        Ok(store.load(instrument, kind.name()))
    });
    match result {
        Ok(Some(state)) => match serde_json::to_string_pretty(&state) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => fail(&TraderError::StateStore {
                reason: e.to_string(),
            }),
        },
        Ok(None) => {
            println!("no state for {instrument} {strategy}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_clear_state(config_path: &PathBuf, instrument: &str, strategy: &str) -> ExitCode {
    let result = load_config(config_path).and_then(|config| {
        let kind: StrategyKind = strategy.parse()?;
        let store = open_state_store(&config)?;
        store.delete(instrument, kind.name())
    });
    match result {
        Ok(()) => {
            println!("cleared state for {instrument} {strategy}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
