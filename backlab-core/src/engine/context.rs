//! Strategy-facing handle into the running engine.
//!
//! Callbacks never touch the engine directly. They receive an
//! `EngineContext` that borrows the order book and position for the
//! duration of one callback. Order and cancel requests take effect on the
//! book immediately, but the resulting notifications are queued and
//! delivered only after the callback returns, so a cancel inside
//! `on_order` cannot reenter the strategy mid-callback.

use crate::domain::{Direction, Offset, OrderRef};
use crate::engine::config::round_to;
use crate::engine::order_book::{MatchEvent, OrderBook};
use chrono::NaiveDateTime;
use std::collections::VecDeque;

pub struct EngineContext<'a> {
    book: &'a mut OrderBook,
    pending: &'a mut VecDeque<MatchEvent>,
    position: f64,
    trading: bool,
    symbol: &'a str,
    pricetick: f64,
    datetime: NaiveDateTime,
    strategy: &'a str,
}

impl<'a> EngineContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        book: &'a mut OrderBook,
        pending: &'a mut VecDeque<MatchEvent>,
        position: f64,
        trading: bool,
        symbol: &'a str,
        pricetick: f64,
        datetime: NaiveDateTime,
        strategy: &'a str,
    ) -> Self {
        Self {
            book,
            pending,
            position,
            trading,
            symbol,
            pricetick,
            datetime,
            strategy,
        }
    }

    /// Place an order. `stop` selects a stop order instead of a limit
    /// order. `lock` is accepted for API parity with live trading but has
    /// no effect in replay, where offsets are informational.
    ///
    /// Prices are rounded to the instrument's pricetick. Returns an empty
    /// vec while trading is disabled (warmup or after stop).
    pub fn send_order(
        &mut self,
        direction: Direction,
        offset: Offset,
        price: f64,
        volume: f64,
        stop: bool,
        _lock: bool,
    ) -> Vec<OrderRef> {
        if !self.trading {
            return Vec::new();
        }
        let price = round_to(price, self.pricetick);
        if stop {
            let id = self.book.place_stop(
                self.symbol,
                direction,
                offset,
                price,
                volume,
                self.strategy,
                self.datetime,
            );
            vec![OrderRef::Stop(id)]
        } else {
            let id = self.book.place_limit(
                self.symbol,
                direction,
                offset,
                price,
                volume,
                self.strategy,
                self.datetime,
            );
            vec![OrderRef::Limit(id)]
        }
    }

    /// Open a long position.
    pub fn buy(&mut self, price: f64, volume: f64, stop: bool) -> Vec<OrderRef> {
        self.send_order(Direction::Long, Offset::Open, price, volume, stop, false)
    }

    /// Close a long position.
    pub fn sell(&mut self, price: f64, volume: f64, stop: bool) -> Vec<OrderRef> {
        self.send_order(Direction::Short, Offset::Close, price, volume, stop, false)
    }

    /// Open a short position.
    pub fn short(&mut self, price: f64, volume: f64, stop: bool) -> Vec<OrderRef> {
        self.send_order(Direction::Short, Offset::Open, price, volume, stop, false)
    }

    /// Close a short position.
    pub fn cover(&mut self, price: f64, volume: f64, stop: bool) -> Vec<OrderRef> {
        self.send_order(Direction::Long, Offset::Close, price, volume, stop, false)
    }

    /// Cancel one order. Unknown and already-terminal ids are silent
    /// no-ops.
    pub fn cancel_order(&mut self, order_ref: OrderRef) {
        let event = match order_ref {
            OrderRef::Limit(id) => self.book.cancel_limit(id),
            OrderRef::Stop(id) => self.book.cancel_stop(id),
        };
        if let Some(ev) = event {
            self.pending.push_back(ev);
        }
    }

    /// Cancel every active order and stop order.
    pub fn cancel_all(&mut self) {
        for ev in self.book.cancel_all() {
            self.pending.push_back(ev);
        }
    }

    /// Current net position in contracts. Positive is long.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Whether order placement is currently enabled.
    pub fn trading(&self) -> bool {
        self.trading
    }

    pub fn symbol(&self) -> &str {
        self.symbol
    }

    pub fn pricetick(&self) -> f64 {
        self.pricetick
    }

    /// Timestamp of the data point being processed.
    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }
}
