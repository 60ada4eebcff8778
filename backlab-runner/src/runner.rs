//! Single-run pipeline: engine, ledger, accountant, statistics.

use crate::statistics::BacktestStatistics;
use backlab_core::accounting::{settle_daily, DailyResult};
use backlab_core::engine::{
    validate_bars, validate_ticks, BacktestEngine, ConfigError, EngineConfig, ReplayError,
};
use backlab_core::ledger::{pair_trades, TradingResult};
use backlab_core::domain::{Bar, Tick, Trade};
use backlab_core::strategy::Strategy;
use thiserror::Error;

/// Errors from the run pipeline.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// Complete output of one backtest run.
#[derive(Debug, Clone)]
pub struct BacktestReport {
    /// Closed round trips, ordered by entry time.
    pub results: Vec<TradingResult>,
    /// Daily settlement ledger, ordered by date.
    pub daily: Vec<DailyResult>,
    pub statistics: BacktestStatistics,
    /// Raw fill stream in execution order.
    pub trades: Vec<Trade>,
}

/// Run one bar-mode backtest to completion. Rejects an empty or
/// non-chronological data sequence, and one with no bars inside the
/// configured window, before the engine starts.
pub fn run_backtest<S: Strategy>(
    config: &EngineConfig,
    bars: &[Bar],
    strategy: S,
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    validate_bars(bars, config.start, config.end)?;
    let summary = BacktestEngine::new(config.clone(), strategy).run_bars(bars);
    Ok(build_report(config, summary))
}

/// Run one tick-mode backtest to completion, with the same data
/// validation as the bar pipeline.
pub fn run_tick_backtest<S: Strategy>(
    config: &EngineConfig,
    ticks: &[Tick],
    strategy: S,
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    validate_ticks(ticks, config.start, config.end)?;
    let summary = BacktestEngine::new(config.clone(), strategy).run_ticks(ticks);
    Ok(build_report(config, summary))
}

fn build_report(
    config: &EngineConfig,
    summary: backlab_core::engine::ReplaySummary,
) -> BacktestReport {
    let cost = config.cost_model();
    let results = pair_trades(
        &summary.trades,
        &cost,
        summary.end_price,
        summary.end_datetime,
    );
    let daily = settle_daily(&summary.daily_closes, &summary.trades, &cost);
    // a run with no fills ranks as the all-zero sentinel
    let statistics = if summary.trades.is_empty() {
        BacktestStatistics::default()
    } else {
        BacktestStatistics::calculate(&daily, &results, config.capital)
    };
    BacktestReport {
        results,
        daily,
        statistics,
        trades: summary.trades,
    }
}
