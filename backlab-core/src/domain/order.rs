use crate::domain::{OrderId, StopOrderId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Signed unit for position arithmetic: +1 for Long, -1 for Short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

/// Whether a trade opens or closes a position. Informational only in
/// backtesting — the ledger derives open/close from FIFO pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Offset {
    Open,
    Close,
}

/// Limit order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Just placed; not yet visible to the market. An order spends exactly
    /// one cross pass here, which models one-bar submission latency.
    Submitting,
    /// Visible and working.
    NotTraded,
    /// Fully filled (terminal).
    AllTraded,
    /// Cancelled before filling (terminal).
    Cancelled,
    /// Rejected by the engine (terminal).
    Rejected,
}

/// A limit order. Mutated only by the order book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub direction: Direction,
    pub offset: Offset,
    pub price: f64,
    pub volume: f64,
    pub traded: f64,
    pub status: OrderStatus,
    pub strategy: String,
    pub datetime: NaiveDateTime,
}

impl Order {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::AllTraded | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// Stop order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopOrderStatus {
    /// Armed, waiting for the trigger price to be crossed.
    Waiting,
    /// Trigger crossed; converted into an immediate fill (terminal).
    Triggered,
    /// Cancelled before triggering (terminal).
    Cancelled,
}

/// A stop order. Never rests as a visible limit order: once its trigger
/// condition is met against the best available price it converts into a
/// fully-filled order plus a trade in the same pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopOrder {
    pub id: StopOrderId,
    pub symbol: String,
    pub direction: Direction,
    pub offset: Offset,
    pub price: f64,
    pub volume: f64,
    pub status: StopOrderStatus,
    pub strategy: String,
    pub datetime: NaiveDateTime,
    /// Id of the synthetic limit order emitted when this stop triggered.
    pub triggered_order: Option<OrderId>,
}

impl StopOrder {
    pub fn is_active(&self) -> bool {
        self.status == StopOrderStatus::Waiting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn sample_order(status: OrderStatus) -> Order {
        Order {
            id: OrderId(1),
            symbol: "IF888".into(),
            direction: Direction::Long,
            offset: Offset::Open,
            price: 100.0,
            volume: 2.0,
            traded: 0.0,
            status,
            strategy: "test".into(),
            datetime: ts(),
        }
    }

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Long.sign(), 1.0);
        assert_eq!(Direction::Short.sign(), -1.0);
    }

    #[test]
    fn submitting_and_not_traded_are_active() {
        assert!(sample_order(OrderStatus::Submitting).is_active());
        assert!(sample_order(OrderStatus::NotTraded).is_active());
    }

    #[test]
    fn terminal_states_are_not_active() {
        assert!(sample_order(OrderStatus::AllTraded).is_terminal());
        assert!(sample_order(OrderStatus::Cancelled).is_terminal());
        assert!(sample_order(OrderStatus::Rejected).is_terminal());
    }

    #[test]
    fn stop_order_active_only_while_waiting() {
        let mut stop = StopOrder {
            id: StopOrderId(1),
            symbol: "IF888".into(),
            direction: Direction::Short,
            offset: Offset::Close,
            price: 95.0,
            volume: 1.0,
            status: StopOrderStatus::Waiting,
            strategy: "test".into(),
            datetime: ts(),
            triggered_order: None,
        };
        assert!(stop.is_active());

        stop.status = StopOrderStatus::Triggered;
        assert!(!stop.is_active());
    }
}
