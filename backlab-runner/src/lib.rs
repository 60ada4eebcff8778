//! Backlab Runner — pipeline wiring, statistics and optimization.
//!
//! Builds on `backlab-core`:
//! - Single-run pipeline producing a `BacktestReport`
//! - Performance statistics over the daily ledger
//! - Grid and genetic parameter search on a rayon worker pool
//! - CSV/JSON report export

pub mod export;
pub mod optimizer;
pub mod runner;
pub mod statistics;

pub use optimizer::{
    genetic_search, grid_search, GeneticConfig, OptimizationResult, OptimizationSetting,
    OptimizeError, Optimizer, ParamSet,
};
pub use runner::{run_backtest, run_tick_backtest, BacktestReport, RunError};
pub use statistics::BacktestStatistics;
