//! Daily mark-to-market settlement.
//!
//! Each session date gets one `DailyResult`. Holding pnl marks the
//! overnight position from the previous close to today's close; trading
//! pnl marks every fill from its price to today's close. The first
//! session has no previous close and uses its own close, which makes its
//! holding pnl zero.

use crate::domain::{CostModel, Trade};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mark-to-market settlement of one session date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyResult {
    pub date: NaiveDate,
    pub close_price: f64,
    pub pre_close: f64,
    pub trade_count: usize,
    pub start_pos: f64,
    pub end_pos: f64,
    pub turnover: f64,
    pub commission: f64,
    pub slippage: f64,
    pub trading_pnl: f64,
    pub holding_pnl: f64,
    pub total_pnl: f64,
    pub net_pnl: f64,
}

impl DailyResult {
    fn new(date: NaiveDate, close_price: f64) -> Self {
        Self {
            date,
            close_price,
            pre_close: 0.0,
            trade_count: 0,
            start_pos: 0.0,
            end_pos: 0.0,
            turnover: 0.0,
            commission: 0.0,
            slippage: 0.0,
            trading_pnl: 0.0,
            holding_pnl: 0.0,
            total_pnl: 0.0,
            net_pnl: 0.0,
        }
    }

    fn settle(&mut self, trades: &[&Trade], pre_close: f64, start_pos: f64, cost: &CostModel) {
        self.pre_close = pre_close;
        self.start_pos = start_pos;
        self.end_pos = start_pos;
        self.trade_count = trades.len();

        self.holding_pnl = if cost.inverse {
            start_pos * (1.0 / pre_close - 1.0 / self.close_price) * cost.size
        } else {
            start_pos * (self.close_price - pre_close) * cost.size
        };

        for trade in trades {
            let pos_change = trade.position_change();
            self.end_pos += pos_change;

            if cost.inverse {
                self.trading_pnl +=
                    pos_change * (1.0 / trade.price - 1.0 / self.close_price) * cost.size;
                self.slippage += trade.volume * cost.size * cost.slippage / trade.price.powi(2);
                let turnover = trade.volume * cost.size / trade.price;
                self.turnover += turnover;
                self.commission += turnover * cost.rate;
            } else {
                self.trading_pnl += pos_change * (self.close_price - trade.price) * cost.size;
                self.slippage += trade.volume * cost.size * cost.slippage;
                let turnover = trade.volume * cost.size * trade.price;
                self.turnover += turnover;
                self.commission += turnover * cost.rate;
            }
        }

        self.total_pnl = self.trading_pnl + self.holding_pnl;
        self.net_pnl = self.total_pnl - self.commission - self.slippage;
    }
}

/// Settle every session date in order, carrying position and close price
/// forward. `closes` is the per-date close map recorded by the engine.
pub fn settle_daily(
    closes: &BTreeMap<NaiveDate, f64>,
    trades: &[Trade],
    cost: &CostModel,
) -> Vec<DailyResult> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&Trade>> = BTreeMap::new();
    for trade in trades {
        let date = trade.datetime.date();
        debug_assert!(closes.contains_key(&date), "trade on date with no close");
        by_date.entry(date).or_default().push(trade);
    }

    let mut results = Vec::with_capacity(closes.len());
    let mut pre_close: Option<f64> = None;
    let mut start_pos = 0.0;

    for (&date, &close) in closes {
        let mut daily = DailyResult::new(date, close);
        let day_trades = by_date.get(&date).map(Vec::as_slice).unwrap_or(&[]);
        // first session marks against its own close
        daily.settle(day_trades, pre_close.unwrap_or(close), start_pos, cost);
        pre_close = Some(close);
        start_pos = daily.end_pos;
        results.push(daily);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, Offset, OrderId, TradeId};
    use chrono::NaiveDateTime;

    fn dt(day: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(9, minute, 0)
            .unwrap()
    }

    fn fill(id: u64, direction: Direction, price: f64, volume: f64, day: u32) -> Trade {
        Trade {
            id: TradeId(id),
            order_id: OrderId(id),
            symbol: "IF888".into(),
            direction,
            offset: Offset::Open,
            price,
            volume,
            datetime: dt(day, 30),
            strategy: "s".into(),
        }
    }

    fn closes(pairs: &[(u32, f64)]) -> BTreeMap<NaiveDate, f64> {
        pairs
            .iter()
            .map(|&(d, c)| (NaiveDate::from_ymd_opt(2024, 1, d).unwrap(), c))
            .collect()
    }

    #[test]
    fn first_day_holding_pnl_is_zero() {
        let closes = closes(&[(2, 100.0)]);
        let results = settle_daily(&closes, &[], &CostModel::frictionless(1.0));

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].pre_close, 100.0);
        assert_eq!(results[0].holding_pnl, 0.0);
        assert_eq!(results[0].net_pnl, 0.0);
    }

    #[test]
    fn trading_pnl_marks_fill_to_close() {
        let closes = closes(&[(2, 105.0)]);
        let trades = vec![fill(1, Direction::Long, 100.0, 2.0, 2)];
        let results = settle_daily(&closes, &trades, &CostModel::frictionless(10.0));

        let day = &results[0];
        assert_eq!(day.trade_count, 1);
        assert_eq!(day.end_pos, 2.0);
        // 2 * (105 - 100) * 10
        assert_eq!(day.trading_pnl, 100.0);
        assert_eq!(day.holding_pnl, 0.0);
        assert_eq!(day.net_pnl, 100.0);
    }

    #[test]
    fn holding_pnl_carries_position_overnight() {
        let closes = closes(&[(2, 105.0), (3, 110.0)]);
        let trades = vec![fill(1, Direction::Long, 100.0, 2.0, 2)];
        let results = settle_daily(&closes, &trades, &CostModel::frictionless(10.0));

        let day2 = &results[1];
        assert_eq!(day2.start_pos, 2.0);
        assert_eq!(day2.end_pos, 2.0);
        assert_eq!(day2.trade_count, 0);
        // 2 * (110 - 105) * 10
        assert_eq!(day2.holding_pnl, 100.0);
        assert_eq!(day2.trading_pnl, 0.0);
    }

    #[test]
    fn short_position_profits_from_falling_close() {
        let closes = closes(&[(2, 100.0), (3, 95.0)]);
        let trades = vec![fill(1, Direction::Short, 100.0, 1.0, 2)];
        let results = settle_daily(&closes, &trades, &CostModel::frictionless(1.0));

        assert_eq!(results[0].end_pos, -1.0);
        // -1 * (95 - 100) * 1
        assert_eq!(results[1].holding_pnl, 5.0);
    }

    #[test]
    fn costs_subtract_from_net() {
        let cost = CostModel {
            rate: 0.001,
            slippage: 0.5,
            size: 10.0,
            inverse: false,
        };
        let closes = closes(&[(2, 100.0)]);
        let trades = vec![fill(1, Direction::Long, 100.0, 1.0, 2)];
        let results = settle_daily(&closes, &trades, &cost);

        let day = &results[0];
        assert_eq!(day.turnover, 100.0 * 10.0);
        assert_eq!(day.commission, 1.0);
        assert_eq!(day.slippage, 5.0);
        assert_eq!(day.net_pnl, day.total_pnl - 6.0);
    }

    #[test]
    fn inverse_contract_uses_reciprocal_prices() {
        let cost = CostModel {
            rate: 0.0,
            slippage: 0.0,
            size: 100.0,
            inverse: true,
        };
        let closes = closes(&[(2, 50_000.0), (3, 40_000.0)]);
        let trades = vec![fill(1, Direction::Long, 50_000.0, 1.0, 2)];
        let results = settle_daily(&closes, &trades, &cost);

        // day 1 trading pnl: 1 * (1/50000 - 1/50000) * 100 = 0
        assert_eq!(results[0].trading_pnl, 0.0);
        // day 2 holding pnl: 1 * (1/50000 - 1/40000) * 100 < 0
        let expected = (1.0 / 50_000.0 - 1.0 / 40_000.0) * 100.0;
        assert!((results[1].holding_pnl - expected).abs() < 1e-12);
    }

    #[test]
    fn dates_without_trades_still_settled() {
        let closes = closes(&[(2, 100.0), (3, 101.0), (4, 102.0)]);
        let results = settle_daily(&closes, &[], &CostModel::frictionless(1.0));
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|d| d.net_pnl == 0.0));
        assert_eq!(results[1].pre_close, 100.0);
        assert_eq!(results[2].pre_close, 101.0);
    }
}
