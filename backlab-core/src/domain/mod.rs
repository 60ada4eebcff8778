//! Core market-data and order-flow types shared by the engine, the
//! ledger and the accountant.

mod ids;
mod market;
mod order;
mod trade;

pub use ids::{OrderId, OrderRef, StopOrderId, TradeId};
pub use market::{BacktestMode, Bar, Interval, Tick};
pub use order::{Direction, Offset, Order, OrderStatus, StopOrder, StopOrderStatus};
pub use trade::{CostModel, Trade};
