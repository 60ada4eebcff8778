//! Fast/slow moving-average crossover strategy.
//!
//! The reference strategy for integration tests and optimization runs.
//! Golden cross goes long one unit, dead cross goes short, always
//! reversing any opposite position first with limit orders at the close.

use crate::domain::{Bar, Trade};
use crate::engine::EngineContext;
use crate::strategy::{FixedVolume, PnlTracker, PositionSizer, Strategy};
use std::collections::VecDeque;

pub struct DualMaStrategy {
    fast_window: usize,
    slow_window: usize,
    sizer: FixedVolume,
    pnl: PnlTracker,
    closes: VecDeque<f64>,
    prev_fast: Option<f64>,
    prev_slow: Option<f64>,
}

impl DualMaStrategy {
    pub fn new(fast_window: usize, slow_window: usize) -> Self {
        Self {
            fast_window,
            slow_window,
            sizer: FixedVolume(1.0),
            pnl: PnlTracker::new(),
            closes: VecDeque::new(),
            prev_fast: None,
            prev_slow: None,
        }
    }

    /// Realized pnl per contract-multiplier unit, accumulated from the
    /// strategy's own fills.
    pub fn realized_pnl(&self) -> f64 {
        self.pnl.realized()
    }

    /// Set a parameter by name. Unknown names are ignored so callers can
    /// feed a full optimization parameter set without filtering.
    pub fn set_param(&mut self, name: &str, value: f64) {
        match name {
            "fast_window" => self.fast_window = value.max(1.0) as usize,
            "slow_window" => self.slow_window = value.max(1.0) as usize,
            "volume" => self.sizer = FixedVolume(value),
            _ => {}
        }
    }

    pub fn fast_window(&self) -> usize {
        self.fast_window
    }

    pub fn slow_window(&self) -> usize {
        self.slow_window
    }

    fn sma(&self, window: usize) -> Option<f64> {
        if window == 0 || self.closes.len() < window {
            return None;
        }
        let sum: f64 = self.closes.iter().rev().take(window).sum();
        Some(sum / window as f64)
    }
}

impl Default for DualMaStrategy {
    fn default() -> Self {
        Self::new(10, 20)
    }
}

impl Strategy for DualMaStrategy {
    fn name(&self) -> &str {
        "dual-ma"
    }

    fn on_bar(&mut self, bar: &Bar, ctx: &mut EngineContext) {
        self.closes.push_back(bar.close);
        if self.closes.len() > self.slow_window.max(self.fast_window) + 1 {
            self.closes.pop_front();
        }

        let (fast, slow) = match (self.sma(self.fast_window), self.sma(self.slow_window)) {
            (Some(f), Some(s)) => (f, s),
            _ => return,
        };
        let (prev_fast, prev_slow) = match (self.prev_fast.replace(fast), self.prev_slow.replace(slow)) {
            (Some(pf), Some(ps)) => (pf, ps),
            _ => return,
        };

        let golden = fast > slow && prev_fast <= prev_slow;
        let dead = fast < slow && prev_fast >= prev_slow;
        let volume = self.sizer.volume(bar.close, 0.0, 0.0);
        let pos = ctx.position();

        if golden {
            if pos < 0.0 {
                ctx.cover(bar.close, -pos, false);
            }
            if pos <= 0.0 {
                ctx.buy(bar.close, volume, false);
            }
        } else if dead {
            if pos > 0.0 {
                ctx.sell(bar.close, pos, false);
            }
            if pos >= 0.0 {
                ctx.short(bar.close, volume, false);
            }
        }
    }

    fn on_trade(&mut self, trade: &Trade, _ctx: &mut EngineContext) {
        self.pnl.record(trade, 1.0);
    }
}
