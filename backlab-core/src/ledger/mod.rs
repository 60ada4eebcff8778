//! FIFO trade ledger: pairs the raw fill stream into closed round trips.
//!
//! Fills are partitioned by owning strategy name and paired first-in
//! first-out within each partition. A fill that outsizes the opposite
//! open lots closes what it can and opens a new lot with the remainder.
//! Lots still open after the last fill are force-closed at the end price.

use crate::domain::{CostModel, Direction, Trade};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// One closed round trip. `volume` is signed: positive for a closed long,
/// negative for a closed short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingResult {
    pub strategy: String,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_time: NaiveDateTime,
    pub volume: f64,
    pub turnover: f64,
    pub commission: f64,
    pub slippage: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
}

impl TradingResult {
    fn new(
        strategy: &str,
        entry_price: f64,
        entry_time: NaiveDateTime,
        exit_price: f64,
        exit_time: NaiveDateTime,
        volume: f64,
        cost: &CostModel,
    ) -> Self {
        let abs_volume = volume.abs();
        let turnover = (entry_price + exit_price) * cost.size * abs_volume;
        let commission = turnover * cost.rate;
        let slippage = 2.0 * cost.size * abs_volume * cost.slippage;
        let pnl = (exit_price - entry_price) * volume * cost.size - commission - slippage;
        let pnl_pct = pnl / entry_price;
        Self {
            strategy: strategy.into(),
            entry_price,
            entry_time,
            exit_price,
            exit_time,
            volume,
            turnover,
            commission,
            slippage,
            pnl,
            pnl_pct,
        }
    }
}

/// An open lot awaiting its closing fill.
#[derive(Debug, Clone)]
struct OpenLot {
    price: f64,
    datetime: NaiveDateTime,
    volume: f64,
}

/// Pair a fill stream into closed round trips.
///
/// Partitions are processed in strategy-name order and fills within a
/// partition in execution order, so the output is fully determined by
/// the input sequence. The final list is sorted by entry time (stable).
pub fn pair_trades(
    trades: &[Trade],
    cost: &CostModel,
    end_price: f64,
    end_time: NaiveDateTime,
) -> Vec<TradingResult> {
    let mut partitions: BTreeMap<&str, Vec<&Trade>> = BTreeMap::new();
    for trade in trades {
        partitions.entry(&trade.strategy).or_default().push(trade);
    }

    let mut results = Vec::new();
    for (strategy, fills) in partitions {
        pair_partition(strategy, &fills, cost, end_price, end_time, &mut results);
    }

    results.sort_by_key(|r| r.entry_time);
    results
}

fn pair_partition(
    strategy: &str,
    fills: &[&Trade],
    cost: &CostModel,
    end_price: f64,
    end_time: NaiveDateTime,
    results: &mut Vec<TradingResult>,
) {
    let mut longs: VecDeque<OpenLot> = VecDeque::new();
    let mut shorts: VecDeque<OpenLot> = VecDeque::new();

    for fill in fills {
        let (opposite, own, sign) = match fill.direction {
            // a long fill closes open shorts; the round trip is short
            Direction::Long => (&mut shorts, &mut longs, -1.0),
            // a short fill closes open longs; the round trip is long
            Direction::Short => (&mut longs, &mut shorts, 1.0),
        };

        let mut remaining = fill.volume;
        while remaining > 0.0 {
            let entry = match opposite.front_mut() {
                Some(lot) => lot,
                None => break,
            };
            let closed = remaining.min(entry.volume);
            results.push(TradingResult::new(
                strategy,
                entry.price,
                entry.datetime,
                fill.price,
                fill.datetime,
                sign * closed,
                cost,
            ));
            remaining -= closed;
            entry.volume -= closed;
            if entry.volume <= 0.0 {
                opposite.pop_front();
            }
        }

        if remaining > 0.0 {
            own.push_back(OpenLot {
                price: fill.price,
                datetime: fill.datetime,
                volume: remaining,
            });
        }
    }

    for lot in longs {
        results.push(TradingResult::new(
            strategy,
            lot.price,
            lot.datetime,
            end_price,
            end_time,
            lot.volume,
            cost,
        ));
    }
    for lot in shorts {
        results.push(TradingResult::new(
            strategy,
            lot.price,
            lot.datetime,
            end_price,
            end_time,
            -lot.volume,
            cost,
        ));
    }
}
