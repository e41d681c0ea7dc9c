//! Append-only CSV trade journal.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Utc};
use serde::Serialize;
use tracing::warn;

use crate::domain::error::TraderError;
use crate::domain::execution::ExecutionResult;
use crate::ports::notification_port::NotificationPort;

#[derive(Debug, Serialize)]
struct TradeRecord<'a> {
    recorded_at: String,
    instrument: &'a str,
    strategy: &'a str,
    direction: String,
    quantity: f64,
    price: f64,
    notional: f64,
    order_ref: &'a str,
}

/// Appends one row per execution. Write failures are logged and dropped.
pub struct CsvTradeJournal {
    path: PathBuf,
    offset: FixedOffset,
}

impl CsvTradeJournal {
    pub fn new<P: AsRef<Path>>(path: P, offset: FixedOffset) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            offset,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, result: &ExecutionResult) -> Result<(), TraderError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let is_new = fs::metadata(&self.path).map_or(true, |m| m.len() == 0);
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer
            .serialize(TradeRecord {
                recorded_at: Utc::now().with_timezone(&self.offset).to_rfc3339(),
                instrument: &result.instrument,
                strategy: &result.strategy_name,
                direction: result.direction.to_string(),
                quantity: result.filled_quantity,
                price: result.filled_price,
                notional: result.filled_notional,
                order_ref: &result.order_ref.0,
            })
            .map_err(|e| TraderError::Io(std::io::Error::other(e)))?;
        writer.flush()?;
        Ok(())
    }
}

impl NotificationPort for CsvTradeJournal {
    fn order_executed(&self, result: &ExecutionResult) {
        if let Err(e) = self.append(result) {
            warn!(path = %self.path.display(), error = %e, "failed to journal trade");
        }
    }

    fn strategy_failed(&self, _instrument: &str, _strategy: &str, _err: &TraderError) {}
}
