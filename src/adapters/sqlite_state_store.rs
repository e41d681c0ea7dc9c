//! SQLite strategy state store: one row per `(instrument, strategy)`.

use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::path::Path;
use tracing::warn;

use crate::domain::error::TraderError;
use crate::domain::state::StrategyState;
use crate::ports::state_port::StateStorePort;

pub struct SqliteStateStore {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> TraderError {
    TraderError::StateStore {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> TraderError {
    TraderError::StateStore {
        reason: e.to_string(),
    }
}

type Row = (f64, String, Option<f64>, Option<f64>);

impl SqliteStateStore {
    /// Open (creating if needed) the database at `path` and ensure the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TraderError> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TraderError::StateStore {
                reason: format!("{}: {e}", parent.display()),
            })?;
        }
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(2).build(manager).map_err(pool_error)?;
        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, TraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(pool_error)?;
        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), TraderError> {
        let conn = self.pool.get().map_err(pool_error)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS strategy_state (
                instrument TEXT NOT NULL,
                strategy TEXT NOT NULL,
                executed_quantity REAL NOT NULL,
                last_run_date TEXT NOT NULL,
                position_size REAL,
                breakout_threshold REAL,
                PRIMARY KEY (instrument, strategy)
            );",
        )
        .map_err(query_error)?;
        Ok(())
    }

    fn fetch(&self, instrument: &str, strategy: &str) -> Result<Option<Row>, TraderError> {
        let conn = self.pool.get().map_err(pool_error)?;
        conn.query_row(
            "SELECT executed_quantity, last_run_date, position_size, breakout_threshold
             FROM strategy_state WHERE instrument = ?1 AND strategy = ?2",
            params![instrument, strategy],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()
        .map_err(query_error)
    }
}

impl StateStorePort for SqliteStateStore {
    fn load(&self, instrument: &str, strategy: &str) -> Option<StrategyState> {
        let (executed_quantity, date, position_size, breakout_threshold) =
            match self.fetch(instrument, strategy) {
                Ok(row) => row?,
                Err(e) => {
                    warn!(instrument, strategy, error = %e, "state read failed, treating as absent");
                    return None;
                }
            };
        let last_run_date = match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(e) => {
                warn!(instrument, strategy, date, error = %e, "bad state date, treating as absent");
                return None;
            }
        };
        Some(StrategyState {
            executed_quantity,
            last_run_date,
            position_size,
            breakout_threshold,
        })
    }

    fn save(&self, instrument: &str, strategy: &str, state: &StrategyState) -> Result<(), TraderError> {
        let conn = self.pool.get().map_err(pool_error)?;
        conn.execute(
            "INSERT OR REPLACE INTO strategy_state
                (instrument, strategy, executed_quantity, last_run_date, position_size, breakout_threshold)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                instrument,
                strategy,
                state.executed_quantity,
                state.last_run_date.format("%Y-%m-%d").to_string(),
                state.position_size,
                state.breakout_threshold
            ],
        )
        .map_err(query_error)?;
        Ok(())
    }

    fn delete(&self, instrument: &str, strategy: &str) -> Result<(), TraderError> {
        let conn = self.pool.get().map_err(pool_error)?;
        conn.execute(
            "DELETE FROM strategy_state WHERE instrument = ?1 AND strategy = ?2",
            params![instrument, strategy],
        )
        .map_err(query_error)?;
        Ok(())
    }
}
