//! Exhaustive grid search over the Cartesian parameter space.

use super::{evaluate, resolve_target, sort_descending};
use super::{OptimizationResult, OptimizationSetting, OptimizeError, ParamSet};
use backlab_core::domain::Bar;
use backlab_core::engine::EngineConfig;
use backlab_core::strategy::Strategy;
use rayon::prelude::*;
use tracing::info;

/// Evaluate every candidate in the grid on the rayon pool and return
/// them sorted descending by target. Candidate order breaks ties, so the
/// ranking is reproducible.
pub fn grid_search<F>(
    config: &EngineConfig,
    bars: &[Bar],
    setting: &OptimizationSetting,
    factory: &F,
) -> Result<Vec<OptimizationResult>, OptimizeError>
where
    F: Fn(&ParamSet) -> Box<dyn Strategy + Send> + Sync,
{
    let target = resolve_target(setting)?;
    let settings = setting.generate_settings()?;
    info!(candidates = settings.len(), target = %target, "starting grid search");

    let mut results: Vec<OptimizationResult> = settings
        .par_iter()
        .map(|params| evaluate(config, bars, factory, params, &target))
        .collect();

    sort_descending(&mut results);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backlab_core::domain::{BacktestMode, Interval};
    use backlab_core::engine::{EngineContext, Warmup};
    use chrono::{NaiveDate, NaiveDateTime};

    fn dt(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, minute, 0)
            .unwrap()
    }

    fn bars() -> Vec<Bar> {
        (0..5)
            .map(|i| Bar {
                symbol: "IF888".into(),
                datetime: dt(i),
                interval: Interval::Minute,
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 10.0,
                open_interest: 0.0,
            })
            .collect()
    }

    fn config() -> EngineConfig {
        EngineConfig {
            symbol: "IF888".into(),
            interval: Interval::Minute,
            start: dt(0),
            end: dt(59),
            rate: 0.0,
            slippage: 0.0,
            size: 1.0,
            pricetick: 0.1,
            capital: 100_000.0,
            mode: BacktestMode::Bar,
            inverse: false,
            warmup: Warmup::Bars(0),
        }
    }

    /// Buys once at a price read from its parameter. Lower entries fill
    /// cheaper, so "edge" orders the ranking deterministically.
    struct ParamBuyer {
        entry: f64,
        bought: bool,
    }

    impl Strategy for ParamBuyer {
        fn name(&self) -> &str {
            "param-buyer"
        }

        fn on_bar(&mut self, _bar: &Bar, ctx: &mut EngineContext) {
            if !self.bought {
                ctx.buy(self.entry, 1.0, false);
                self.bought = true;
            }
        }
    }

    fn factory(params: &ParamSet) -> Box<dyn Strategy + Send> {
        let entry = params
            .iter()
            .find(|(n, _)| n == "entry")
            .map(|&(_, v)| v)
            .unwrap_or(100.0);
        Box::new(ParamBuyer {
            entry,
            bought: false,
        })
    }

    #[test]
    fn grid_results_sorted_descending_by_target() {
        let mut setting = OptimizationSetting::new();
        setting.add_range("entry", 99.0, 101.0, 1.0).unwrap();
        setting.set_target("total_net_pnl");

        let results = grid_search(&config(), &bars(), &setting, &factory).unwrap();

        assert_eq!(results.len(), 3);
        for pair in results.windows(2) {
            assert!(pair[0].target >= pair[1].target);
        }
        // cheapest entry wins: force-closed at 100 after buying at 99
        assert_eq!(results[0].params[0].1, 99.0);
    }

    #[test]
    fn missing_target_rejected() {
        let mut setting = OptimizationSetting::new();
        setting.add_parameter("entry", 100.0);
        assert!(matches!(
            grid_search(&config(), &bars(), &setting, &factory),
            Err(OptimizeError::MissingTarget)
        ));
    }

    #[test]
    fn unknown_target_rejected() {
        let mut setting = OptimizationSetting::new();
        setting.add_parameter("entry", 100.0);
        setting.set_target("alpha_decay");
        assert!(matches!(
            grid_search(&config(), &bars(), &setting, &factory),
            Err(OptimizeError::UnknownMetric(_))
        ));
    }

    #[test]
    fn panicking_candidate_ranks_last() {
        let mut setting = OptimizationSetting::new();
        setting.add_range("entry", 99.0, 100.0, 1.0).unwrap();
        setting.set_target("total_net_pnl");

        let panicky = |params: &ParamSet| -> Box<dyn Strategy + Send> {
            if params[0].1 == 99.0 {
                panic!("bad candidate");
            }
            factory(params)
        };
        let results = grid_search(&config(), &bars(), &setting, &panicky).unwrap();

        assert_eq!(results.len(), 2);
        let worst = results.last().unwrap();
        assert_eq!(worst.target, f64::NEG_INFINITY);
        assert_eq!(worst.params[0].1, 99.0);
    }
}
