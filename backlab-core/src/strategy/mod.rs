//! Strategy trait and building blocks.
//!
//! A strategy is a state machine driven by engine callbacks. Every
//! callback receives an [`EngineContext`] for placing and cancelling
//! orders and inspecting the current position. Cross-cutting behaviors
//! (position sizing, order retry, pnl tracking) are separate capability
//! traits composed into strategies by embedding.

mod capabilities;
mod dual_ma;

pub use capabilities::{
    CapitalFraction, ChaseRetry, FixedVolume, NoRetry, OrderRetryPolicy, PnlTracker,
    PositionSizer, RetryDecision,
};
pub use dual_ma::DualMaStrategy;

use crate::domain::{Bar, Order, StopOrder, Tick, Trade};
use crate::engine::EngineContext;

pub trait Strategy {
    fn name(&self) -> &str;

    /// Called once before any data is delivered.
    fn on_init(&mut self, _ctx: &mut EngineContext) {}

    /// Called when warmup completes and trading is enabled.
    fn on_start(&mut self, _ctx: &mut EngineContext) {}

    /// Called after the last data point.
    fn on_stop(&mut self, _ctx: &mut EngineContext) {}

    fn on_bar(&mut self, _bar: &Bar, _ctx: &mut EngineContext) {}

    fn on_tick(&mut self, _tick: &Tick, _ctx: &mut EngineContext) {}

    /// Order state change: accepted, filled or cancelled.
    fn on_order(&mut self, _order: &Order, _ctx: &mut EngineContext) {}

    /// A fill. The context position already reflects it.
    fn on_trade(&mut self, _trade: &Trade, _ctx: &mut EngineContext) {}

    /// Stop order state change: triggered or cancelled.
    fn on_stop_order(&mut self, _stop: &StopOrder, _ctx: &mut EngineContext) {}
}

impl<S: Strategy + ?Sized> Strategy for &mut S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn on_init(&mut self, ctx: &mut EngineContext) {
        (**self).on_init(ctx)
    }

    fn on_start(&mut self, ctx: &mut EngineContext) {
        (**self).on_start(ctx)
    }

    fn on_stop(&mut self, ctx: &mut EngineContext) {
        (**self).on_stop(ctx)
    }

    fn on_bar(&mut self, bar: &Bar, ctx: &mut EngineContext) {
        (**self).on_bar(bar, ctx)
    }

    fn on_tick(&mut self, tick: &Tick, ctx: &mut EngineContext) {
        (**self).on_tick(tick, ctx)
    }

    fn on_order(&mut self, order: &Order, ctx: &mut EngineContext) {
        (**self).on_order(order, ctx)
    }

    fn on_trade(&mut self, trade: &Trade, ctx: &mut EngineContext) {
        (**self).on_trade(trade, ctx)
    }

    fn on_stop_order(&mut self, stop: &StopOrder, ctx: &mut EngineContext) {
        (**self).on_stop_order(stop, ctx)
    }
}

impl Strategy for Box<dyn Strategy + Send> {
    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn on_init(&mut self, ctx: &mut EngineContext) {
        self.as_mut().on_init(ctx)
    }

    fn on_start(&mut self, ctx: &mut EngineContext) {
        self.as_mut().on_start(ctx)
    }

    fn on_stop(&mut self, ctx: &mut EngineContext) {
        self.as_mut().on_stop(ctx)
    }

    fn on_bar(&mut self, bar: &Bar, ctx: &mut EngineContext) {
        self.as_mut().on_bar(bar, ctx)
    }

    fn on_tick(&mut self, tick: &Tick, ctx: &mut EngineContext) {
        self.as_mut().on_tick(tick, ctx)
    }

    fn on_order(&mut self, order: &Order, ctx: &mut EngineContext) {
        self.as_mut().on_order(order, ctx)
    }

    fn on_trade(&mut self, trade: &Trade, ctx: &mut EngineContext) {
        self.as_mut().on_trade(trade, ctx)
    }

    fn on_stop_order(&mut self, stop: &StopOrder, ctx: &mut EngineContext) {
        self.as_mut().on_stop_order(stop, ctx)
    }
}
