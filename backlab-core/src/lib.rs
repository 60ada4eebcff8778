//! Backlab Core — replay engine, domain types, ledger and accounting.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, ticks, orders, stop orders, trades)
//! - Replay driver merging chronological data streams
//! - Matching engine with deterministic submission-order crossing
//! - FIFO trade ledger pairing fills into closed round trips
//! - Daily mark-to-market accountant
//! - Strategy trait with composable sizing/retry/pnl capabilities

pub mod accounting;
pub mod domain;
pub mod engine;
pub mod ledger;
pub mod strategy;
