#![allow(dead_code)]

use chrono::{Days, NaiveDate, NaiveTime};
use sessiontrader::domain::candle::{HalfDayCandle, Period};
use sessiontrader::domain::clock::FixedClock;
use sessiontrader::domain::error::TraderError;
use sessiontrader::domain::execution::{
    ExecutionResult, Fill, OrderDirection, OrderRef, OrderState, OrderStatus,
};
use sessiontrader::domain::history::IndicatorHistory;
use sessiontrader::domain::order_executor::{ExecutorConfig, OrderExecutor};
use sessiontrader::domain::runner::{run_tick, TickReport};
use sessiontrader::domain::state::StrategyState;
use sessiontrader::domain::strategy::{Strategy, StrategyConfig, StrategyContext, TickOutcome};
use sessiontrader::ports::data_port::DataPort;
use sessiontrader::ports::exchange_port::ExchangePort;
use sessiontrader::ports::notification_port::NotificationPort;
use sessiontrader::ports::state_port::StateStorePort;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

pub const BTC: &str = "KRW-BTC";
pub const ETH: &str = "KRW-ETH";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn today() -> NaiveDate {
    date(2025, 10, 20)
}

pub fn yesterday() -> NaiveDate {
    date(2025, 10, 19)
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn fast_executor() -> ExecutorConfig {
    ExecutorConfig {
        poll_interval: Duration::from_millis(1),
        timeout: Duration::from_millis(20),
    }
}

pub fn strategy_config() -> StrategyConfig {
    StrategyConfig {
        target_volatility: 0.01,
        volatility_floor: 0.01,
        total_capital: 1_000_000.0,
        allocated_capital: 500_000.0,
        min_order_amount: 5000.0,
    }
}

/// (open, high, low, close, volume)
pub type Ohlcv = (f64, f64, f64, f64, f64);

fn half(date: NaiveDate, period: Period, (open, high, low, close, volume): Ohlcv) -> HalfDayCandle {
    HalfDayCandle {
        date,
        period,
        open,
        high,
        low,
        close,
        volume,
    }
}

/// One morning/afternoon pair per entry, ending the day before `today()`.
pub fn history_of(days: &[(Ohlcv, Ohlcv)]) -> IndicatorHistory {
    let first = today().checked_sub_days(Days::new(days.len() as u64)).unwrap();
    let candles = days
        .iter()
        .enumerate()
        .flat_map(|(i, &(morning, afternoon))| {
            let d = first.checked_add_days(Days::new(i as u64)).unwrap();
            [half(d, Period::Morning, morning), half(d, Period::Afternoon, afternoon)]
        })
        .collect();
    IndicatorHistory::new(candles)
}

/// Rising afternoons, mornings with range 10 and noise 0.5 on open 100.
///
/// Yields position size 0.1 (vol 0.1, target 0.01, MA score 1) and breakout
/// threshold 100 + 10 * 0.5 = 105.
pub fn breakout_history() -> IndicatorHistory {
    let morning = (100.0, 105.0, 95.0, 105.0, 10.0);
    history_of(&[
        (morning, (100.0, 101.0, 89.0, 90.0, 20.0)),
        (morning, (100.0, 101.0, 94.0, 95.0, 20.0)),
        (morning, (100.0, 101.0, 99.0, 100.0, 20.0)),
    ])
}

/// Falling afternoons: MA score 0 disables breakout entries.
pub fn downtrend_history() -> IndicatorHistory {
    let morning = (100.0, 105.0, 95.0, 105.0, 10.0);
    history_of(&[
        (morning, (100.0, 121.0, 109.0, 120.0, 20.0)),
        (morning, (100.0, 111.0, 99.0, 110.0, 20.0)),
        (morning, (100.0, 101.0, 99.0, 100.0, 20.0)),
    ])
}

/// Yesterday's afternoon rose on more volume than its morning when `signal`.
///
/// Morning volatility is 0.02, so morning/afternoon sizing is 0.5.
pub fn morning_afternoon_history(signal: bool) -> IndicatorHistory {
    let afternoon_volume = if signal { 30.0 } else { 5.0 };
    history_of(&[(
        (100.0, 101.0, 99.0, 100.5, 10.0),
        (100.0, 103.0, 99.5, 102.0, afternoon_volume),
    )])
}

pub struct MockCollector {
    history: RefCell<Result<IndicatorHistory, String>>,
    pub calls: Cell<usize>,
}

impl MockCollector {
    pub fn new(history: IndicatorHistory) -> Self {
        Self {
            history: RefCell::new(Ok(history)),
            calls: Cell::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            history: RefCell::new(Err(reason.to_string())),
            calls: Cell::new(0),
        }
    }

    pub fn set(&self, history: IndicatorHistory) {
        *self.history.borrow_mut() = Ok(history);
    }
}

impl DataPort for MockCollector {
    fn collect(&self, instrument: &str) -> Result<IndicatorHistory, TraderError> {
        self.calls.set(self.calls.get() + 1);
        match &*self.history.borrow() {
            Ok(h) => Ok(h.clone()),
            Err(reason) => Err(TraderError::NoData {
                instrument: format!("{instrument}: {reason}"),
            }),
        }
    }
}

/// Exchange double. Orders fill completely at the current price unless fills
/// were scripted with [`MockExchange::script`]; `stuck` keeps every order
/// pending forever.
pub struct MockExchange {
    price: Cell<f64>,
    pub stuck: Cell<bool>,
    pub fail_submit: RefCell<Option<String>>,
    scripted: RefCell<VecDeque<Vec<Fill>>>,
    orders: RefCell<HashMap<OrderRef, Vec<Fill>>>,
    pub submitted: RefCell<Vec<(String, OrderDirection, f64)>>,
    pub price_checks: Cell<usize>,
}

impl MockExchange {
    pub fn new(price: f64) -> Self {
        Self {
            price: Cell::new(price),
            stuck: Cell::new(false),
            fail_submit: RefCell::new(None),
            scripted: RefCell::new(VecDeque::new()),
            orders: RefCell::new(HashMap::new()),
            submitted: RefCell::new(Vec::new()),
            price_checks: Cell::new(0),
        }
    }

    pub fn set_price(&self, price: f64) {
        self.price.set(price);
    }

    /// Fills returned for the next submitted order.
    pub fn script(&self, fills: Vec<Fill>) {
        self.scripted.borrow_mut().push_back(fills);
    }

    pub fn orders_submitted(&self) -> usize {
        self.submitted.borrow().len()
    }

    fn submit(&self, instrument: &str, direction: OrderDirection, amount: f64, full_quantity: f64) -> Result<OrderRef, TraderError> {
        if let Some(reason) = self.fail_submit.borrow().as_ref() {
            return Err(TraderError::exchange(reason.clone()));
        }
        let mut submitted = self.submitted.borrow_mut();
        submitted.push((instrument.to_string(), direction, amount));
        let order_ref = OrderRef(format!("mock-{}", submitted.len()));

        let fills = self.scripted.borrow_mut().pop_front().unwrap_or_else(|| {
            vec![Fill {
                quantity: full_quantity,
                price: self.price.get(),
            }]
        });
        self.orders.borrow_mut().insert(order_ref.clone(), fills);
        Ok(order_ref)
    }
}

impl ExchangePort for MockExchange {
    fn submit_market_buy(&self, instrument: &str, notional: f64) -> Result<OrderRef, TraderError> {
        let quantity = notional / self.price.get();
        self.submit(instrument, OrderDirection::Buy, notional, quantity)
    }

    fn submit_market_sell(&self, instrument: &str, quantity: f64) -> Result<OrderRef, TraderError> {
        self.submit(instrument, OrderDirection::Sell, quantity, quantity)
    }

    fn order_status(&self, order_ref: &OrderRef) -> Result<OrderStatus, TraderError> {
        if self.stuck.get() {
            return Ok(OrderStatus {
                state: OrderState::Wait,
                fills: Vec::new(),
            });
        }
        let orders = self.orders.borrow();
        let fills = orders
            .get(order_ref)
            .cloned()
            .ok_or_else(|| TraderError::exchange(format!("unknown order {order_ref}")))?;
        let state = if fills.is_empty() {
            OrderState::Cancel
        } else {
            OrderState::Done
        };
        Ok(OrderStatus { state, fills })
    }

    fn available_balance(&self, _currency: &str) -> Result<f64, TraderError> {
        Ok(1_000_000.0)
    }

    fn current_price(&self, _instrument: &str) -> Result<f64, TraderError> {
        self.price_checks.set(self.price_checks.get() + 1);
        Ok(self.price.get())
    }
}

#[derive(Default)]
pub struct MemoryStateStore {
    records: RefCell<HashMap<(String, String), StrategyState>>,
    pub saves: Cell<usize>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, instrument: &str, strategy: &str, state: StrategyState) -> Self {
        self.records
            .borrow_mut()
            .insert((instrument.to_string(), strategy.to_string()), state);
        self
    }
}

impl StateStorePort for MemoryStateStore {
    fn load(&self, instrument: &str, strategy: &str) -> Option<StrategyState> {
        self.records
            .borrow()
            .get(&(instrument.to_string(), strategy.to_string()))
            .cloned()
    }

    fn save(&self, instrument: &str, strategy: &str, state: &StrategyState) -> Result<(), TraderError> {
        self.saves.set(self.saves.get() + 1);
        self.records
            .borrow_mut()
            .insert((instrument.to_string(), strategy.to_string()), state.clone());
        Ok(())
    }

    fn delete(&self, instrument: &str, strategy: &str) -> Result<(), TraderError> {
        self.records
            .borrow_mut()
            .remove(&(instrument.to_string(), strategy.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub executions: RefCell<Vec<ExecutionResult>>,
    pub failures: RefCell<Vec<(String, String, String)>>,
}

impl NotificationPort for RecordingNotifier {
    fn order_executed(&self, result: &ExecutionResult) {
        self.executions.borrow_mut().push(result.clone());
    }

    fn strategy_failed(&self, instrument: &str, strategy: &str, error: &TraderError) {
        self.failures
            .borrow_mut()
            .push((instrument.to_string(), strategy.to_string(), error.to_string()));
    }
}

/// Everything one strategy tick needs, with a clock pinned to `today()`.
pub struct Harness<S: StateStorePort = MemoryStateStore> {
    pub clock: FixedClock,
    pub collector: MockCollector,
    pub store: S,
    pub exchange: MockExchange,
    pub notifier: RecordingNotifier,
}

impl Harness<MemoryStateStore> {
    pub fn new(history: IndicatorHistory, price: f64) -> Self {
        Harness::with_store(history, price, MemoryStateStore::new())
    }
}

impl<S: StateStorePort> Harness<S> {
    pub fn with_store(history: IndicatorHistory, price: f64, store: S) -> Self {
        Self {
            clock: FixedClock::at_local(today(), hm(9, 0)),
            collector: MockCollector::new(history),
            store,
            exchange: MockExchange::new(price),
            notifier: RecordingNotifier::default(),
        }
    }

    pub fn morning(&self) {
        self.clock.set_local(today(), hm(9, 0));
    }

    pub fn afternoon(&self) {
        self.clock.set_local(today(), hm(13, 0));
    }

    pub fn tick(&self, strategy: &dyn Strategy) -> Result<TickOutcome, TraderError> {
        let executor = OrderExecutor::new(&self.exchange, &self.notifier, fast_executor());
        let ctx = StrategyContext {
            clock: &self.clock,
            collector: &self.collector,
            store: &self.store,
            market: &self.exchange,
            executor: &executor,
        };
        strategy.execute(&ctx)
    }

    pub fn run(&self, strategies: &[Box<dyn Strategy>]) -> TickReport {
        let executor = OrderExecutor::new(&self.exchange, &self.notifier, fast_executor());
        let ctx = StrategyContext {
            clock: &self.clock,
            collector: &self.collector,
            store: &self.store,
            market: &self.exchange,
            executor: &executor,
        };
        run_tick(strategies, &ctx, &self.notifier)
    }

    pub fn state(&self, instrument: &str, strategy: &str) -> Option<StrategyState> {
        self.store.load(instrument, strategy)
    }
}
