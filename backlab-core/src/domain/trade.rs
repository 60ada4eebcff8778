use crate::domain::{Direction, Offset, OrderId, TradeId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A fill. Immutable once created by the matching engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub order_id: OrderId,
    pub symbol: String,
    pub direction: Direction,
    pub offset: Offset,
    pub price: f64,
    pub volume: f64,
    pub datetime: NaiveDateTime,
    /// Name of the strategy instance that owns the originating order.
    /// The ledger partitions the trade stream by this name.
    pub strategy: String,
}

impl Trade {
    /// Position delta caused by this trade: +volume for Long, -volume for Short.
    pub fn position_change(&self) -> f64 {
        self.direction.sign() * self.volume
    }
}

/// Shared read-only cost parameters applied by the ledger and the accountant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Commission rate applied to turnover.
    pub rate: f64,
    /// Assumed per-unit execution cost beyond the quoted price.
    pub slippage: f64,
    /// Contract multiplier.
    pub size: f64,
    /// Inverse contract: pnl is computed on reciprocal prices.
    pub inverse: bool,
}

impl CostModel {
    pub fn frictionless(size: f64) -> Self {
        Self {
            rate: 0.0,
            slippage: 0.0,
            size,
            inverse: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn position_change_signed_by_direction() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let mut trade = Trade {
            id: TradeId(1),
            order_id: OrderId(1),
            symbol: "IF888".into(),
            direction: Direction::Long,
            offset: Offset::Open,
            price: 100.0,
            volume: 3.0,
            datetime: dt,
            strategy: "test".into(),
        };
        assert_eq!(trade.position_change(), 3.0);

        trade.direction = Direction::Short;
        assert_eq!(trade.position_change(), -3.0);
    }
}
