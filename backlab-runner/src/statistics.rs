//! Performance statistics over the daily ledger and round-trip list.
//!
//! The balance series is capital plus the running sum of daily net pnl.
//! Daily returns are log returns of that series. A run with no trades
//! yields the all-zero struct rather than an error, so optimization
//! workers can rank degenerate parameter sets without special cases.

use backlab_core::accounting::DailyResult;
use backlab_core::ledger::TradingResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trading days per year used for annualization.
const ANNUAL_DAYS: f64 = 240.0;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BacktestStatistics {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_days: usize,
    pub profit_days: usize,
    pub loss_days: usize,

    pub capital: f64,
    pub end_balance: f64,

    pub max_drawdown: f64,
    pub max_ddpercent: f64,
    pub max_drawdown_duration: i64,

    pub total_net_pnl: f64,
    pub daily_net_pnl: f64,
    pub total_commission: f64,
    pub daily_commission: f64,
    pub total_slippage: f64,
    pub daily_slippage: f64,
    pub total_turnover: f64,
    pub daily_turnover: f64,
    pub total_trade_count: usize,
    pub daily_trade_count: f64,

    pub total_return: f64,
    pub annual_return: f64,
    pub daily_return: f64,
    pub return_std: f64,
    pub sharpe_ratio: f64,
    pub return_drawdown_ratio: f64,

    pub win_rate: f64,
    pub average_winning: f64,
    pub average_losing: f64,
    pub profit_loss_ratio: f64,
}

impl BacktestStatistics {
    /// Compute the full metric set. `daily` must be date-ordered.
    /// Returns the zero struct when the daily ledger is empty.
    pub fn calculate(daily: &[DailyResult], results: &[TradingResult], capital: f64) -> Self {
        if daily.is_empty() {
            return Self::default();
        }

        let mut stats = Self {
            start_date: daily.first().map(|d| d.date),
            end_date: daily.last().map(|d| d.date),
            total_days: daily.len(),
            capital,
            ..Self::default()
        };

        // balance, drawdown and log-return series in one pass
        let mut balance = capital;
        let mut highlevel = capital;
        let mut highlevel_date = stats.start_date;
        let mut prev_balance = capital;
        let mut returns: Vec<f64> = Vec::with_capacity(daily.len());

        for day in daily {
            balance += day.net_pnl;
            if day.net_pnl > 0.0 {
                stats.profit_days += 1;
            } else if day.net_pnl < 0.0 {
                stats.loss_days += 1;
            }

            if balance >= highlevel {
                highlevel = balance;
                highlevel_date = Some(day.date);
            }
            let drawdown = balance - highlevel;
            let ddpercent = if highlevel > 0.0 {
                drawdown / highlevel * 100.0
            } else {
                0.0
            };
            if drawdown < stats.max_drawdown {
                stats.max_drawdown = drawdown;
            }
            if ddpercent < stats.max_ddpercent {
                stats.max_ddpercent = ddpercent;
            }
            if drawdown < 0.0 {
                if let Some(peak) = highlevel_date {
                    let duration = (day.date - peak).num_days();
                    stats.max_drawdown_duration = stats.max_drawdown_duration.max(duration);
                }
            }

            let daily_return = if prev_balance > 0.0 && balance > 0.0 {
                (balance / prev_balance).ln() * 100.0
            } else {
                0.0
            };
            returns.push(daily_return);
            prev_balance = balance;

            stats.total_net_pnl += day.net_pnl;
            stats.total_commission += day.commission;
            stats.total_slippage += day.slippage;
            stats.total_turnover += day.turnover;
            stats.total_trade_count += day.trade_count;
        }
        stats.end_balance = balance;

        let n = daily.len() as f64;
        stats.daily_net_pnl = stats.total_net_pnl / n;
        stats.daily_commission = stats.total_commission / n;
        stats.daily_slippage = stats.total_slippage / n;
        stats.daily_turnover = stats.total_turnover / n;
        stats.daily_trade_count = stats.total_trade_count as f64 / n;

        stats.total_return = (stats.end_balance / capital - 1.0) * 100.0;
        stats.annual_return = stats.total_return / n * ANNUAL_DAYS;
        stats.daily_return = returns.iter().sum::<f64>() / n;
        let variance = returns
            .iter()
            .map(|r| (r - stats.daily_return).powi(2))
            .sum::<f64>()
            / n;
        stats.return_std = variance.sqrt();
        stats.sharpe_ratio = if stats.return_std > 0.0 {
            stats.daily_return / stats.return_std * ANNUAL_DAYS.sqrt()
        } else {
            0.0
        };
        stats.return_drawdown_ratio = if stats.max_ddpercent < 0.0 {
            -stats.total_return / stats.max_ddpercent
        } else {
            0.0
        };

        stats.trade_metrics(results);
        stats
    }

    fn trade_metrics(&mut self, results: &[TradingResult]) {
        if results.is_empty() {
            return;
        }
        let winners: Vec<f64> = results.iter().filter(|r| r.pnl > 0.0).map(|r| r.pnl).collect();
        let losers: Vec<f64> = results.iter().filter(|r| r.pnl <= 0.0).map(|r| r.pnl).collect();

        self.win_rate = winners.len() as f64 / results.len() as f64 * 100.0;
        if !winners.is_empty() {
            self.average_winning = winners.iter().sum::<f64>() / winners.len() as f64;
        }
        if !losers.is_empty() {
            self.average_losing = losers.iter().sum::<f64>() / losers.len() as f64;
        }
        if self.average_losing < 0.0 {
            self.profit_loss_ratio = -self.average_winning / self.average_losing;
        }
    }

    /// Look up a metric by its snake_case name. Optimization targets
    /// resolve through this.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.to_map().get(name).copied()
    }

    /// All scalar metrics keyed by snake_case name.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        let mut map = BTreeMap::new();
        map.insert("total_days", self.total_days as f64);
        map.insert("profit_days", self.profit_days as f64);
        map.insert("loss_days", self.loss_days as f64);
        map.insert("capital", self.capital);
        map.insert("end_balance", self.end_balance);
        map.insert("max_drawdown", self.max_drawdown);
        map.insert("max_ddpercent", self.max_ddpercent);
        map.insert("max_drawdown_duration", self.max_drawdown_duration as f64);
        map.insert("total_net_pnl", self.total_net_pnl);
        map.insert("daily_net_pnl", self.daily_net_pnl);
        map.insert("total_commission", self.total_commission);
        map.insert("daily_commission", self.daily_commission);
        map.insert("total_slippage", self.total_slippage);
        map.insert("daily_slippage", self.daily_slippage);
        map.insert("total_turnover", self.total_turnover);
        map.insert("daily_turnover", self.daily_turnover);
        map.insert("total_trade_count", self.total_trade_count as f64);
        map.insert("daily_trade_count", self.daily_trade_count);
        map.insert("total_return", self.total_return);
        map.insert("annual_return", self.annual_return);
        map.insert("daily_return", self.daily_return);
        map.insert("return_std", self.return_std);
        map.insert("sharpe_ratio", self.sharpe_ratio);
        map.insert("return_drawdown_ratio", self.return_drawdown_ratio);
        map.insert("win_rate", self.win_rate);
        map.insert("average_winning", self.average_winning);
        map.insert("average_losing", self.average_losing);
        map.insert("profit_loss_ratio", self.profit_loss_ratio);
        map
    }
}
