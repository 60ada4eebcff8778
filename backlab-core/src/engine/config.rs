//! Engine configuration and validation.

use crate::domain::{BacktestMode, CostModel, Interval};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("start {0} is not before end {1}")]
    StartNotBeforeEnd(NaiveDateTime, NaiveDateTime),

    #[error("contract size must be positive, got {0}")]
    NonPositiveSize(f64),

    #[error("pricetick must be positive, got {0}")]
    NonPositivePriceTick(f64),
}

/// Warmup policy: how much of the leading data is consumed to prime
/// strategy state before trading is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Warmup {
    /// A fixed count of leading bars or ticks.
    Bars(usize),
    /// A count of leading calendar days.
    Days(u32),
}

impl Default for Warmup {
    fn default() -> Self {
        Warmup::Bars(0)
    }
}

/// Full parameter set for one backtest run. Immutable once validated;
/// shared read-only across optimization workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub symbol: String,
    pub interval: Interval,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Commission rate applied to turnover.
    pub rate: f64,
    /// Assumed per-unit slippage on each fill.
    pub slippage: f64,
    /// Contract multiplier.
    pub size: f64,
    /// Minimum price increment. Submitted prices are rounded to it.
    pub pricetick: f64,
    /// Starting capital for the balance series.
    pub capital: f64,
    pub mode: BacktestMode,
    /// Inverse contract: pnl computed on reciprocal prices.
    pub inverse: bool,
    pub warmup: Warmup,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start >= self.end {
            return Err(ConfigError::StartNotBeforeEnd(self.start, self.end));
        }
        if self.size <= 0.0 {
            return Err(ConfigError::NonPositiveSize(self.size));
        }
        if self.pricetick <= 0.0 {
            return Err(ConfigError::NonPositivePriceTick(self.pricetick));
        }
        Ok(())
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel {
            rate: self.rate,
            slippage: self.slippage,
            size: self.size,
            inverse: self.inverse,
        }
    }
}

/// Round a price to the nearest multiple of `pricetick`.
pub fn round_to(price: f64, pricetick: f64) -> f64 {
    (price / pricetick).round() * pricetick
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn base_config() -> EngineConfig {
        EngineConfig {
            symbol: "IF888".into(),
            interval: Interval::Minute,
            start: dt(2024, 1, 1),
            end: dt(2024, 6, 30),
            rate: 0.0003,
            slippage: 0.2,
            size: 300.0,
            pricetick: 0.2,
            capital: 1_000_000.0,
            mode: BacktestMode::Bar,
            inverse: false,
            warmup: Warmup::Bars(0),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn start_after_end_rejected() {
        let mut cfg = base_config();
        cfg.start = dt(2024, 7, 1);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::StartNotBeforeEnd(_, _))
        ));
    }

    #[test]
    fn start_equal_end_rejected() {
        let mut cfg = base_config();
        cfg.end = cfg.start;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_positive_size_rejected() {
        let mut cfg = base_config();
        cfg.size = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::NonPositiveSize(_))));
    }

    #[test]
    fn non_positive_pricetick_rejected() {
        let mut cfg = base_config();
        cfg.pricetick = -0.2;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositivePriceTick(_))
        ));
    }

    #[test]
    fn round_to_snaps_to_tick() {
        assert!((round_to(100.07, 0.2) - 100.0).abs() < 1e-9);
        assert!((round_to(100.11, 0.2) - 100.2).abs() < 1e-9);
        assert!((round_to(100.0, 0.2) - 100.0).abs() < 1e-9);
    }
}
