//! Persisted per-(instrument, strategy) state record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where a strategy stands for a given trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionPhase {
    /// No record, or a record from another day.
    Flat,
    /// Today's parameters are cached but nothing has been bought.
    Computed,
    /// Holding a quantity bought today.
    Held,
}

/// Parameters a strategy derives once per day from the indicator history.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DailyParams {
    pub position_size: Option<f64>,
    pub breakout_threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyState {
    #[serde(default)]
    pub executed_quantity: f64,
    pub last_run_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakout_threshold: Option<f64>,
}

impl StrategyState {
    pub fn computed(today: NaiveDate, params: DailyParams) -> Self {
        Self::held(today, 0.0, params)
    }

    pub fn held(today: NaiveDate, executed_quantity: f64, params: DailyParams) -> Self {
        StrategyState {
            executed_quantity,
            last_run_date: today,
            position_size: params.position_size,
            breakout_threshold: params.breakout_threshold,
        }
    }

    pub fn params(&self) -> DailyParams {
        DailyParams {
            position_size: self.position_size,
            breakout_threshold: self.breakout_threshold,
        }
    }

    pub fn is_for(&self, today: NaiveDate) -> bool {
        self.last_run_date == today
    }

    pub fn has_position(&self, today: NaiveDate) -> bool {
        self.is_for(today) && self.executed_quantity > 0.0
    }

    pub fn phase(&self, today: NaiveDate) -> PositionPhase {
        if self.has_position(today) {
            PositionPhase::Held
        } else if self.is_for(today) {
            PositionPhase::Computed
        } else {
            PositionPhase::Flat
        }
    }

    /// Copy with the held quantity lowered to `remaining`; never raises it.
    pub fn with_remaining(&self, remaining: f64) -> Self {
        StrategyState {
            executed_quantity: remaining.min(self.executed_quantity).max(0.0),
            ..self.clone()
        }
    }
}

/// Phase of an optional record; a missing record is flat.
pub fn phase_of(state: Option<&StrategyState>, today: NaiveDate) -> PositionPhase {
    state.map_or(PositionPhase::Flat, |s| s.phase(today))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 20).unwrap()
    }

    fn yesterday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 19).unwrap()
    }

    fn breakout_params() -> DailyParams {
        DailyParams {
            position_size: Some(0.5),
            breakout_threshold: Some(105.0),
        }
    }

    #[test]
    fn held_today_has_position() {
        let state = StrategyState::held(today(), 1.0, breakout_params());
        assert!(state.has_position(today()));
        assert_eq!(state.phase(today()), PositionPhase::Held);
    }

    #[test]
    fn held_yesterday_is_flat() {
        let state = StrategyState::held(yesterday(), 1.0, breakout_params());
        assert!(!state.has_position(today()));
        assert_eq!(state.phase(today()), PositionPhase::Flat);
    }

    #[test]
    fn zero_quantity_today_is_computed() {
        let state = StrategyState::computed(today(), breakout_params());
        assert!(!state.has_position(today()));
        assert_eq!(state.phase(today()), PositionPhase::Computed);
    }

    #[test]
    fn missing_record_is_flat() {
        assert_eq!(phase_of(None, today()), PositionPhase::Flat);
    }

    #[test]
    fn with_remaining_never_increases() {
        let state = StrategyState::held(today(), 1.0, breakout_params());
        assert_eq!(state.with_remaining(0.6).executed_quantity, 0.6);
        assert_eq!(state.with_remaining(1.5).executed_quantity, 1.0);
        assert_eq!(state.with_remaining(-0.1).executed_quantity, 0.0);
        assert_eq!(state.with_remaining(0.6).params(), breakout_params());
    }

    #[test]
    fn serializes_as_flat_camel_case_object() {
        let state = StrategyState::held(today(), 0.25, breakout_params());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["executedQuantity"], 0.25);
        assert_eq!(json["lastRunDate"], "2025-10-20");
        assert_eq!(json["positionSize"], 0.5);
        assert_eq!(json["breakoutThreshold"], 105.0);
    }

    #[test]
    fn omits_absent_strategy_fields() {
        let state = StrategyState::computed(today(), DailyParams::default());
        let json = serde_json::to_string(&state).unwrap();
        assert!(!json.contains("positionSize"));
        assert!(!json.contains("breakoutThreshold"));
        let back: StrategyState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn missing_quantity_defaults_to_zero() {
        let state: StrategyState = serde_json::from_str(r#"{"lastRunDate":"2025-10-20"}"#).unwrap();
        assert_eq!(state.executed_quantity, 0.0);
        assert_eq!(state.phase(today()), PositionPhase::Computed);
    }
}
