//! Optimization orchestrator: exhaustive grid search and a seeded
//! genetic search over a strategy parameter space.
//!
//! Every evaluation builds a fresh pipeline from the shared read-only
//! base config and data, so workers share no mutable state. A failed or
//! panicking evaluation is logged and ranked with a negative-infinity
//! target instead of aborting the whole search.

mod genetic;
mod grid;
mod setting;

pub use genetic::{genetic_search, EvalCache, GeneticConfig};
pub use grid::grid_search;
pub use setting::{OptimizationSetting, OptimizeError, ParamSet};

use crate::runner::run_backtest;
use crate::statistics::BacktestStatistics;
use backlab_core::domain::Bar;
use backlab_core::engine::EngineConfig;
use backlab_core::strategy::Strategy;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;

/// One ranked candidate from a search.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub params: ParamSet,
    pub target: f64,
    pub statistics: BacktestStatistics,
}

/// Borrowed view of everything a search needs: one base config, one data
/// set, and a factory producing a configured strategy per candidate.
pub struct Optimizer<'a, F> {
    config: &'a EngineConfig,
    bars: &'a [Bar],
    factory: F,
}

impl<'a, F> Optimizer<'a, F>
where
    F: Fn(&ParamSet) -> Box<dyn Strategy + Send> + Sync,
{
    pub fn new(config: &'a EngineConfig, bars: &'a [Bar], factory: F) -> Self {
        Self {
            config,
            bars,
            factory,
        }
    }

    /// Evaluate the full Cartesian grid, sorted descending by target.
    pub fn grid_search(
        &self,
        setting: &OptimizationSetting,
    ) -> Result<Vec<OptimizationResult>, OptimizeError> {
        grid_search(self.config, self.bars, setting, &self.factory)
    }

    /// Seeded genetic search, returning the running best candidates
    /// sorted descending by target.
    pub fn genetic_search(
        &self,
        setting: &OptimizationSetting,
        ga: &GeneticConfig,
    ) -> Result<Vec<OptimizationResult>, OptimizeError> {
        genetic_search(self.config, self.bars, setting, &self.factory, ga)
    }
}

/// Resolve and validate the search target against the known metric set.
fn resolve_target(setting: &OptimizationSetting) -> Result<String, OptimizeError> {
    let name = setting.target().ok_or(OptimizeError::MissingTarget)?;
    if BacktestStatistics::default().metric(name).is_none() {
        return Err(OptimizeError::UnknownMetric(name.to_owned()));
    }
    Ok(name.to_owned())
}

/// Run one candidate in isolation. Failures rank at negative infinity
/// with zeroed statistics.
fn evaluate<F>(
    config: &EngineConfig,
    bars: &[Bar],
    factory: &F,
    params: &ParamSet,
    target: &str,
) -> OptimizationResult
where
    F: Fn(&ParamSet) -> Box<dyn Strategy + Send> + Sync,
{
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        run_backtest(config, bars, factory(params))
    }));

    match outcome {
        Ok(Ok(report)) => {
            let value = report
                .statistics
                .metric(target)
                .unwrap_or(f64::NEG_INFINITY);
            OptimizationResult {
                params: params.clone(),
                target: value,
                statistics: report.statistics,
            }
        }
        Ok(Err(err)) => {
            warn!(?params, %err, "optimization candidate failed");
            failed(params)
        }
        Err(_) => {
            warn!(?params, "optimization candidate panicked");
            failed(params)
        }
    }
}

fn failed(params: &ParamSet) -> OptimizationResult {
    OptimizationResult {
        params: params.clone(),
        target: f64::NEG_INFINITY,
        statistics: BacktestStatistics::default(),
    }
}

/// Descending by target; stable, so equal targets keep candidate order.
fn sort_descending(results: &mut [OptimizationResult]) {
    results.sort_by(|a, b| b.target.total_cmp(&a.target));
}
