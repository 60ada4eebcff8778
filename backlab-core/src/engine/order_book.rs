//! Order book and matching passes.
//!
//! The book is the single registry for limit and stop orders. Orders are
//! keyed by monotonically increasing ids in `BTreeMap`s, so every iteration
//! walks them in submission order. That ordering is the determinism
//! contract of the whole engine: two runs over the same data visit orders
//! identically, fill them identically, and emit trades identically.
//!
//! Matching is optimistic and full-fill only:
//! - a resting long limit fills when the period's low trades through its
//!   price, at the better of its price and the open;
//! - a resting short limit fills when the high trades through, likewise;
//! - a stop triggers when the period's range reaches its price and fills
//!   at the worse of its price and the open, producing a synthetic
//!   fully-filled order record plus a trade.
//!
//! Orders placed during a callback rest as `Submitting` and only flip to
//! `NotTraded` at the top of the next matching pass. They are eligible to
//! fill in that same pass.

use crate::domain::{
    Bar, Direction, Offset, Order, OrderId, OrderStatus, StopOrder, StopOrderId, StopOrderStatus,
    Tick, Trade, TradeId,
};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};

/// A state change produced by a matching pass or a cancellation, in the
/// order the strategy must observe it.
#[derive(Debug, Clone)]
pub enum MatchEvent {
    /// Submitting order surfaced as resting (`NotTraded`).
    OrderAccepted(Order),
    /// Limit order fully filled.
    OrderFilled { order: Order, trade: Trade },
    /// Stop order triggered: synthetic filled order record plus its trade.
    StopTriggered {
        stop: StopOrder,
        order: Order,
        trade: Trade,
    },
    OrderCancelled(Order),
    StopCancelled(StopOrder),
}

/// Reference prices for one matching pass, derived from the current bar
/// or tick by the event loop.
#[derive(Debug, Clone, Copy)]
pub struct CrossPrices {
    /// Price a resting long limit is compared against (bar low / ask).
    pub long_cross: f64,
    /// Price a resting short limit is compared against (bar high / bid).
    pub short_cross: f64,
    /// Best achievable fill for a long (bar open / ask).
    pub long_best: f64,
    /// Best achievable fill for a short (bar open / bid).
    pub short_best: f64,
}

impl CrossPrices {
    pub fn limit_from_bar(bar: &Bar) -> Self {
        Self {
            long_cross: bar.low,
            short_cross: bar.high,
            long_best: bar.open,
            short_best: bar.open,
        }
    }

    pub fn limit_from_tick(tick: &Tick) -> Self {
        Self {
            long_cross: tick.ask_price,
            short_cross: tick.bid_price,
            long_best: tick.ask_price,
            short_best: tick.bid_price,
        }
    }

    /// Stop triggers scan the full traded range of the period.
    pub fn stop_from_bar(bar: &Bar) -> Self {
        Self {
            long_cross: bar.high,
            short_cross: bar.low,
            long_best: bar.open,
            short_best: bar.open,
        }
    }

    pub fn stop_from_tick(tick: &Tick) -> Self {
        Self {
            long_cross: tick.last_price,
            short_cross: tick.last_price,
            long_best: tick.last_price,
            short_best: tick.last_price,
        }
    }
}

/// Order registry plus matching passes. Owns id allocation for orders,
/// stop orders and trades.
pub struct OrderBook {
    orders: BTreeMap<OrderId, Order>,
    active_orders: BTreeSet<OrderId>,
    stops: BTreeMap<StopOrderId, StopOrder>,
    active_stops: BTreeSet<StopOrderId>,
    next_order: u64,
    next_stop: u64,
    next_trade: u64,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            orders: BTreeMap::new(),
            active_orders: BTreeSet::new(),
            stops: BTreeMap::new(),
            active_stops: BTreeSet::new(),
            next_order: 0,
            next_stop: 0,
            next_trade: 0,
        }
    }

    // ── Placement and cancellation ─────────────────────────────────────

    /// Register a new limit order as `Submitting`. It becomes visible to
    /// matching at the top of the next pass.
    #[allow(clippy::too_many_arguments)]
    pub fn place_limit(
        &mut self,
        symbol: &str,
        direction: Direction,
        offset: Offset,
        price: f64,
        volume: f64,
        strategy: &str,
        datetime: NaiveDateTime,
    ) -> OrderId {
        self.next_order += 1;
        let id = OrderId(self.next_order);
        self.orders.insert(
            id,
            Order {
                id,
                symbol: symbol.into(),
                direction,
                offset,
                price,
                volume,
                traded: 0.0,
                status: OrderStatus::Submitting,
                strategy: strategy.into(),
                datetime,
            },
        );
        self.active_orders.insert(id);
        id
    }

    /// Register a new stop order as `Waiting`.
    #[allow(clippy::too_many_arguments)]
    pub fn place_stop(
        &mut self,
        symbol: &str,
        direction: Direction,
        offset: Offset,
        price: f64,
        volume: f64,
        strategy: &str,
        datetime: NaiveDateTime,
    ) -> StopOrderId {
        self.next_stop += 1;
        let id = StopOrderId(self.next_stop);
        self.stops.insert(
            id,
            StopOrder {
                id,
                symbol: symbol.into(),
                direction,
                offset,
                price,
                volume,
                status: StopOrderStatus::Waiting,
                strategy: strategy.into(),
                datetime,
                triggered_order: None,
            },
        );
        self.active_stops.insert(id);
        id
    }

    /// Cancel an active limit order. Unknown or inactive ids are a no-op.
    pub fn cancel_limit(&mut self, id: OrderId) -> Option<MatchEvent> {
        if !self.active_orders.remove(&id) {
            return None;
        }
        let order = self.orders.get_mut(&id)?;
        order.status = OrderStatus::Cancelled;
        Some(MatchEvent::OrderCancelled(order.clone()))
    }

    /// Cancel an active stop order. Unknown or inactive ids are a no-op.
    pub fn cancel_stop(&mut self, id: StopOrderId) -> Option<MatchEvent> {
        if !self.active_stops.remove(&id) {
            return None;
        }
        let stop = self.stops.get_mut(&id)?;
        stop.status = StopOrderStatus::Cancelled;
        Some(MatchEvent::StopCancelled(stop.clone()))
    }

    /// Cancel every active order and stop, in submission order.
    pub fn cancel_all(&mut self) -> Vec<MatchEvent> {
        let order_ids: Vec<OrderId> = self.active_orders.iter().copied().collect();
        let stop_ids: Vec<StopOrderId> = self.active_stops.iter().copied().collect();
        let mut events = Vec::with_capacity(order_ids.len() + stop_ids.len());
        for id in order_ids {
            if let Some(ev) = self.cancel_limit(id) {
                events.push(ev);
            }
        }
        for id in stop_ids {
            if let Some(ev) = self.cancel_stop(id) {
                events.push(ev);
            }
        }
        events
    }

    // ── Matching passes ────────────────────────────────────────────────

    /// One limit-order pass. Flips `Submitting` orders to `NotTraded`
    /// (emitting `OrderAccepted`), then fills every resting order whose
    /// price the period traded through.
    pub fn cross_limit(&mut self, prices: CrossPrices, datetime: NaiveDateTime) -> Vec<MatchEvent> {
        let mut events = Vec::new();
        let ids: Vec<OrderId> = self.active_orders.iter().copied().collect();

        for id in ids {
            let order = match self.orders.get_mut(&id) {
                Some(o) => o,
                None => continue,
            };

            if order.status == OrderStatus::Submitting {
                order.status = OrderStatus::NotTraded;
                events.push(MatchEvent::OrderAccepted(order.clone()));
            }

            let crossed = match order.direction {
                Direction::Long => order.price >= prices.long_cross && prices.long_cross > 0.0,
                Direction::Short => order.price <= prices.short_cross && prices.short_cross > 0.0,
            };
            if !crossed {
                continue;
            }

            order.traded = order.volume;
            order.status = OrderStatus::AllTraded;
            let fill_price = match order.direction {
                Direction::Long => order.price.min(prices.long_best),
                Direction::Short => order.price.max(prices.short_best),
            };
            let filled = order.clone();
            self.active_orders.remove(&id);

            self.next_trade += 1;
            let trade = Trade {
                id: TradeId(self.next_trade),
                order_id: id,
                symbol: filled.symbol.clone(),
                direction: filled.direction,
                offset: filled.offset,
                price: fill_price,
                volume: filled.volume,
                datetime,
                strategy: filled.strategy.clone(),
            };
            events.push(MatchEvent::OrderFilled {
                order: filled,
                trade,
            });
        }

        events
    }

    /// One stop-order pass. A triggered stop becomes a synthetic
    /// fully-filled order record plus a trade at the worse of its price
    /// and the period's best price.
    pub fn cross_stop(&mut self, prices: CrossPrices, datetime: NaiveDateTime) -> Vec<MatchEvent> {
        let mut events = Vec::new();
        let ids: Vec<StopOrderId> = self.active_stops.iter().copied().collect();

        for id in ids {
            let stop = match self.stops.get(&id) {
                Some(s) => s,
                None => continue,
            };

            let triggered = match stop.direction {
                Direction::Long => stop.price <= prices.long_cross,
                Direction::Short => stop.price >= prices.short_cross,
            };
            if !triggered {
                continue;
            }

            let fill_price = match stop.direction {
                Direction::Long => stop.price.max(prices.long_best),
                Direction::Short => stop.price.min(prices.short_best),
            };

            let stop = stop.clone();
            self.next_order += 1;
            let order_id = OrderId(self.next_order);
            let order = Order {
                id: order_id,
                symbol: stop.symbol.clone(),
                direction: stop.direction,
                offset: stop.offset,
                price: stop.price,
                volume: stop.volume,
                traded: stop.volume,
                status: OrderStatus::AllTraded,
                strategy: stop.strategy.clone(),
                datetime,
            };
            self.orders.insert(order_id, order.clone());

            self.next_trade += 1;
            let trade = Trade {
                id: TradeId(self.next_trade),
                order_id,
                symbol: stop.symbol.clone(),
                direction: stop.direction,
                offset: stop.offset,
                price: fill_price,
                volume: stop.volume,
                datetime,
                strategy: stop.strategy.clone(),
            };

            self.active_stops.remove(&id);
            let stop = match self.stops.get_mut(&id) {
                Some(stored) => {
                    stored.status = StopOrderStatus::Triggered;
                    stored.triggered_order = Some(order_id);
                    stored.clone()
                }
                None => continue,
            };

            events.push(MatchEvent::StopTriggered { stop, order, trade });
        }

        events
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn get_order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn get_stop(&self, id: StopOrderId) -> Option<&StopOrder> {
        self.stops.get(&id)
    }

    pub fn active_order_count(&self) -> usize {
        self.active_orders.len()
    }

    pub fn active_stop_count(&self) -> usize {
        self.active_stops.len()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn trade_count(&self) -> u64 {
        self.next_trade
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
