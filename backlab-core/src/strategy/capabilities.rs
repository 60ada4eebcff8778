//! Cross-cutting strategy behaviors as composable traits.
//!
//! Sizing, retry and pnl tracking are orthogonal to signal logic, so
//! they live behind small traits a strategy embeds as fields. Tests can
//! swap in fixed implementations without touching the signal code.

use crate::domain::{Order, Trade};

// ── Position sizing ────────────────────────────────────────────────────

/// Decides the volume of an entry order.
pub trait PositionSizer {
    /// Volume in whole contracts for an entry at `price`.
    fn volume(&self, price: f64, capital: f64, contract_size: f64) -> f64;
}

/// Always trade the same volume.
#[derive(Debug, Clone, Copy)]
pub struct FixedVolume(pub f64);

impl PositionSizer for FixedVolume {
    fn volume(&self, _price: f64, _capital: f64, _contract_size: f64) -> f64 {
        self.0
    }
}

/// Deploy a fixed fraction of capital per entry, floored to whole
/// contracts.
#[derive(Debug, Clone, Copy)]
pub struct CapitalFraction(pub f64);

impl PositionSizer for CapitalFraction {
    fn volume(&self, price: f64, capital: f64, contract_size: f64) -> f64 {
        let notional_per_contract = price * contract_size;
        if notional_per_contract <= 0.0 {
            return 0.0;
        }
        (capital * self.0 / notional_per_contract).floor().max(0.0)
    }
}

// ── Order retry ────────────────────────────────────────────────────────

/// What to do with a cancelled or unfilled working order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryDecision {
    GiveUp,
    /// Re-place at the given price.
    Requote(f64),
}

pub trait OrderRetryPolicy {
    /// Called when a working order is cancelled without filling.
    /// `market_price` is the latest traded price.
    fn on_cancelled(&mut self, order: &Order, market_price: f64) -> RetryDecision;
}

/// Never retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl OrderRetryPolicy for NoRetry {
    fn on_cancelled(&mut self, _order: &Order, _market_price: f64) -> RetryDecision {
        RetryDecision::GiveUp
    }
}

/// Chase the market a bounded number of times, stepping the quote one
/// increment toward the latest price on each attempt.
#[derive(Debug, Clone, Copy)]
pub struct ChaseRetry {
    pub max_retries: u32,
    pub step: f64,
    attempts: u32,
}

impl ChaseRetry {
    pub fn new(max_retries: u32, step: f64) -> Self {
        Self {
            max_retries,
            step,
            attempts: 0,
        }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

impl OrderRetryPolicy for ChaseRetry {
    fn on_cancelled(&mut self, order: &Order, market_price: f64) -> RetryDecision {
        if self.attempts >= self.max_retries {
            return RetryDecision::GiveUp;
        }
        self.attempts += 1;
        let price = if market_price > order.price {
            (order.price + self.step).min(market_price)
        } else {
            (order.price - self.step).max(market_price)
        };
        RetryDecision::Requote(price)
    }
}

// ── Pnl tracking ───────────────────────────────────────────────────────

/// Running realized/unrealized pnl from the trade flow, using
/// average-price position accounting.
#[derive(Debug, Clone, Copy, Default)]
pub struct PnlTracker {
    position: f64,
    avg_price: f64,
    realized: f64,
}

impl PnlTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, trade: &Trade, contract_size: f64) {
        let change = trade.position_change();
        let same_side = self.position == 0.0 || self.position.signum() == change.signum();

        if same_side {
            let total = self.position.abs() + change.abs();
            if total > 0.0 {
                self.avg_price = (self.avg_price * self.position.abs()
                    + trade.price * change.abs())
                    / total;
            }
            self.position += change;
        } else {
            let closed = change.abs().min(self.position.abs());
            self.realized +=
                (trade.price - self.avg_price) * closed * self.position.signum() * contract_size;
            self.position += change;
            if self.position != 0.0 && self.position.signum() == change.signum() {
                // flipped through flat; remainder opens at the fill price
                self.avg_price = trade.price;
            } else if self.position == 0.0 {
                self.avg_price = 0.0;
            }
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn realized(&self) -> f64 {
        self.realized
    }

    pub fn unrealized(&self, mark_price: f64, contract_size: f64) -> f64 {
        (mark_price - self.avg_price) * self.position * contract_size
    }
}
