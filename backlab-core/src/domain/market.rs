//! Market data units — bars and ticks.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Aggregation interval of a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    Minute,
    Hour,
    Daily,
}

/// Which data granularity a backtest replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BacktestMode {
    Bar,
    Tick,
}

/// OHLCV bar for a single instrument over one interval.
///
/// Immutable once produced by the data source; the engine never writes to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub datetime: NaiveDateTime,
    pub interval: Interval,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_interest: f64,
}

impl Bar {
    /// Basic OHLC sanity check: high bounds open/close from above,
    /// low from below, all prices positive.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// A single market-data update: last traded price plus best bid/ask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub datetime: NaiveDateTime,
    pub last_price: f64,
    pub bid_price: f64,
    pub bid_volume: f64,
    pub ask_price: f64,
    pub ask_volume: f64,
}
