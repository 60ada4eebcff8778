//! The replay event loop.
//!
//! One engine owns one strategy instance and one order book, and drives
//! them over a chronological data sequence. Per data point the sequence
//! is fixed: match resting limit orders, match stop orders, deliver the
//! data point to the strategy, record the daily close. Notifications
//! produced by matching or by requests made inside a callback are drained
//! between steps, never reentrantly.

use crate::domain::{Bar, Tick, Trade};
use crate::engine::config::{EngineConfig, Warmup};
use crate::engine::context::EngineContext;
use crate::engine::order_book::{CrossPrices, MatchEvent, OrderBook};
use crate::strategy::Strategy;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, VecDeque};

/// Everything downstream stages need from one replay: the trade stream in
/// execution order, close prices per session date, and the final price
/// and timestamp for force-closing open lots.
#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub trades: Vec<Trade>,
    pub daily_closes: BTreeMap<NaiveDate, f64>,
    pub end_price: f64,
    pub end_datetime: NaiveDateTime,
}

pub struct BacktestEngine<S: Strategy> {
    config: EngineConfig,
    book: OrderBook,
    pending: VecDeque<MatchEvent>,
    position: f64,
    trading: bool,
    datetime: NaiveDateTime,
    trades: Vec<Trade>,
    daily_closes: BTreeMap<NaiveDate, f64>,
    strategy: S,
    strategy_name: String,
}

impl<S: Strategy> BacktestEngine<S> {
    pub fn new(config: EngineConfig, strategy: S) -> Self {
        let strategy_name = strategy.name().to_owned();
        let datetime = config.start;
        Self {
            config,
            book: OrderBook::new(),
            pending: VecDeque::new(),
            position: 0.0,
            trading: false,
            datetime,
            trades: Vec::new(),
            daily_closes: BTreeMap::new(),
            strategy,
            strategy_name,
        }
    }

    /// Replay a bar sequence to completion.
    pub fn run_bars(mut self, bars: &[Bar]) -> ReplaySummary {
        self.callback(|s, ctx| s.on_init(ctx));
        let mut warmup = WarmupGate::new(self.config.warmup);
        let mut end_price = 0.0;

        for bar in bars {
            if bar.datetime < self.config.start || bar.datetime > self.config.end {
                continue;
            }
            self.enable_trading_if_warm(&mut warmup, bar.datetime);
            self.process_bar(bar);
            end_price = bar.close;
        }

        self.callback(|s, ctx| s.on_stop(ctx));
        self.finish(end_price)
    }

    /// Replay a tick sequence to completion.
    pub fn run_ticks(mut self, ticks: &[Tick]) -> ReplaySummary {
        self.callback(|s, ctx| s.on_init(ctx));
        let mut warmup = WarmupGate::new(self.config.warmup);
        let mut end_price = 0.0;

        for tick in ticks {
            if tick.datetime < self.config.start || tick.datetime > self.config.end {
                continue;
            }
            self.enable_trading_if_warm(&mut warmup, tick.datetime);
            self.process_tick(tick);
            end_price = tick.last_price;
        }

        self.callback(|s, ctx| s.on_stop(ctx));
        self.finish(end_price)
    }

    // ── Per-datapoint steps ────────────────────────────────────────────

    fn process_bar(&mut self, bar: &Bar) {
        self.datetime = bar.datetime;
        if self.trading {
            let events = self
                .book
                .cross_limit(CrossPrices::limit_from_bar(bar), bar.datetime);
            self.pending.extend(events);
            self.drain_events();

            let events = self
                .book
                .cross_stop(CrossPrices::stop_from_bar(bar), bar.datetime);
            self.pending.extend(events);
            self.drain_events();
        }

        self.callback(|s, ctx| s.on_bar(bar, ctx));

        if self.trading {
            self.daily_closes.insert(bar.datetime.date(), bar.close);
        }
    }

    fn process_tick(&mut self, tick: &Tick) {
        self.datetime = tick.datetime;
        if self.trading {
            let events = self
                .book
                .cross_limit(CrossPrices::limit_from_tick(tick), tick.datetime);
            self.pending.extend(events);
            self.drain_events();

            let events = self
                .book
                .cross_stop(CrossPrices::stop_from_tick(tick), tick.datetime);
            self.pending.extend(events);
            self.drain_events();
        }

        self.callback(|s, ctx| s.on_tick(tick, ctx));

        if self.trading {
            self.daily_closes.insert(tick.datetime.date(), tick.last_price);
        }
    }

    fn enable_trading_if_warm(&mut self, warmup: &mut WarmupGate, datetime: NaiveDateTime) {
        if !self.trading && warmup.admit(datetime) {
            self.trading = true;
            self.callback(|s, ctx| s.on_start(ctx));
        }
    }

    fn finish(self, end_price: f64) -> ReplaySummary {
        ReplaySummary {
            trades: self.trades,
            daily_closes: self.daily_closes,
            end_price,
            end_datetime: self.datetime,
        }
    }

    // ── Callback plumbing ──────────────────────────────────────────────

    /// Run one strategy callback against a fresh context, then deliver
    /// any notifications it produced.
    fn callback(&mut self, f: impl FnOnce(&mut S, &mut EngineContext)) {
        self.run_callback(f);
        self.drain_events();
    }

    fn run_callback(&mut self, f: impl FnOnce(&mut S, &mut EngineContext)) {
        let Self {
            config,
            book,
            pending,
            position,
            trading,
            datetime,
            strategy,
            strategy_name,
            ..
        } = self;
        let mut ctx = EngineContext::new(
            book,
            pending,
            *position,
            *trading,
            &config.symbol,
            config.pricetick,
            *datetime,
            strategy_name,
        );
        f(strategy, &mut ctx);
    }

    /// Deliver queued notifications in order. Callbacks may queue further
    /// notifications (for example a cancel inside `on_order`); the loop
    /// runs until the queue is empty. Position updates happen before the
    /// corresponding `on_trade`.
    fn drain_events(&mut self) {
        while let Some(event) = self.pending.pop_front() {
            match event {
                MatchEvent::OrderAccepted(order) | MatchEvent::OrderCancelled(order) => {
                    self.run_callback(|s, ctx| s.on_order(&order, ctx));
                }
                MatchEvent::OrderFilled { order, trade } => {
                    self.run_callback(|s, ctx| s.on_order(&order, ctx));
                    self.position += trade.position_change();
                    self.run_callback(|s, ctx| s.on_trade(&trade, ctx));
                    self.trades.push(trade);
                }
                MatchEvent::StopTriggered { stop, order, trade } => {
                    self.run_callback(|s, ctx| s.on_stop_order(&stop, ctx));
                    self.run_callback(|s, ctx| s.on_order(&order, ctx));
                    self.position += trade.position_change();
                    self.run_callback(|s, ctx| s.on_trade(&trade, ctx));
                    self.trades.push(trade);
                }
                MatchEvent::StopCancelled(stop) => {
                    self.run_callback(|s, ctx| s.on_stop_order(&stop, ctx));
                }
            }
        }
    }
}

/// Tracks whether enough leading data has passed to enable trading.
struct WarmupGate {
    policy: Warmup,
    seen: usize,
    first_date: Option<NaiveDate>,
}

impl WarmupGate {
    fn new(policy: Warmup) -> Self {
        Self {
            policy,
            seen: 0,
            first_date: None,
        }
    }

    /// Returns true once the data point at `datetime` lies past warmup.
    fn admit(&mut self, datetime: NaiveDateTime) -> bool {
        let warm = match self.policy {
            Warmup::Bars(n) => self.seen >= n,
            Warmup::Days(n) => {
                let first = *self.first_date.get_or_insert(datetime.date());
                datetime.date() >= first + Duration::days(i64::from(n))
            }
        };
        self.seen += 1;
        warm
    }
}
