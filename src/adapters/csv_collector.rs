//! CSV hourly-bar collector.
//!
//! Reads `<dir>/<instrument>.csv` with header
//! `timestamp,open,high,low,close,volume` (RFC 3339 timestamps) and folds the
//! bars into morning/afternoon candles in the clock's timezone.

use std::path::{Path, PathBuf};

use chrono::DateTime;
use serde::Deserialize;
use tracing::debug;

use crate::domain::candle::{aggregate_half_days, HourlyBar};
use crate::domain::clock::Clock;
use crate::domain::error::TraderError;
use crate::domain::history::IndicatorHistory;
use crate::ports::data_port::DataPort;

#[derive(Debug, Deserialize)]
struct BarRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub struct CsvCollector<'a> {
    base_path: PathBuf,
    history_days: usize,
    clock: &'a dyn Clock,
}

impl<'a> CsvCollector<'a> {
    pub fn new<P: AsRef<Path>>(base_path: P, history_days: usize, clock: &'a dyn Clock) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            history_days,
            clock,
        }
    }

    fn csv_path(&self, instrument: &str) -> PathBuf {
        self.base_path.join(format!("{instrument}.csv"))
    }

    pub fn read_bars(&self, instrument: &str) -> Result<Vec<HourlyBar>, TraderError> {
        let path = self.csv_path(instrument);
        if !path.exists() {
            return Err(TraderError::NoData {
                instrument: instrument.to_string(),
            });
        }
        let file = path.display().to_string();
        let parse_error = |reason: String| TraderError::DataParse {
            file: file.clone(),
            reason,
        };

        let offset = *self.clock.now().offset();
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| parse_error(e.to_string()))?;

        let mut bars = Vec::new();
        for record in rdr.deserialize::<BarRecord>() {
            let record = record.map_err(|e| parse_error(e.to_string()))?;
            let timestamp = DateTime::parse_from_rfc3339(&record.timestamp)
                .map_err(|e| parse_error(format!("invalid timestamp '{}': {e}", record.timestamp)))?
                .with_timezone(&offset);
            bars.push(HourlyBar {
                timestamp,
                open: record.open,
                high: record.high,
                low: record.low,
                close: record.close,
                volume: record.volume,
            });
        }

        if bars.is_empty() {
            return Err(TraderError::NoData {
                instrument: instrument.to_string(),
            });
        }
        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    /// Close of the most recent bar, used as the quoted price.
    pub fn latest_close(&self, instrument: &str) -> Result<f64, TraderError> {
        let bars = self.read_bars(instrument)?;
        bars.last().map(|b| b.close).ok_or_else(|| TraderError::NoData {
            instrument: instrument.to_string(),
        })
    }
}

impl DataPort for CsvCollector<'_> {
    fn collect(&self, instrument: &str) -> Result<IndicatorHistory, TraderError> {
        let bars = self.read_bars(instrument)?;
        let candles = aggregate_half_days(
            &bars,
            self.clock.today(),
            self.history_days,
            self.clock.session_split(),
        );
        debug!(instrument, bars = bars.len(), candles = candles.len(), "collected history");
        Ok(IndicatorHistory::new(candles))
    }
}
