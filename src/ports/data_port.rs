//! Data collector port: supplies prior-session indicators for an instrument.

use crate::domain::error::TraderError;
use crate::domain::history::IndicatorHistory;

pub trait DataPort {
    fn collect(&self, instrument: &str) -> Result<IndicatorHistory, TraderError>;
}
