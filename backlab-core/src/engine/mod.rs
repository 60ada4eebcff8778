//! Replay driver, matching engine and the strategy-facing context.

mod config;
mod context;
mod event_loop;
mod order_book;
mod replay;

pub use config::{round_to, ConfigError, EngineConfig, Warmup};
pub use context::EngineContext;
pub use event_loop::{BacktestEngine, ReplaySummary};
pub use order_book::{CrossPrices, MatchEvent, OrderBook};
pub use replay::{merge_bar_streams, merge_tick_streams, validate_bars, validate_ticks, ReplayError};
