//! Report export (CSV/JSON).

use crate::runner::BacktestReport;
use anyhow::{Context, Result};
use backlab_core::accounting::DailyResult;
use backlab_core::ledger::TradingResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn write_results_csv(path: &Path, results: &[TradingResult]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create results CSV {}", path.display()))?;

    writeln!(
        file,
        "strategy,entry_time,entry_price,exit_time,exit_price,volume,turnover,commission,slippage,pnl,pnl_pct"
    )?;

    for r in results {
        writeln!(
            file,
            "{},{},{:.4},{},{:.4},{},{:.4},{:.4},{:.4},{:.4},{:.6}",
            r.strategy,
            r.entry_time,
            r.entry_price,
            r.exit_time,
            r.exit_price,
            r.volume,
            r.turnover,
            r.commission,
            r.slippage,
            r.pnl,
            r.pnl_pct
        )?;
    }

    Ok(())
}

pub fn write_daily_csv(path: &Path, daily: &[DailyResult]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create daily CSV {}", path.display()))?;

    writeln!(
        file,
        "date,close_price,pre_close,trade_count,start_pos,end_pos,turnover,commission,slippage,trading_pnl,holding_pnl,total_pnl,net_pnl"
    )?;

    for d in daily {
        writeln!(
            file,
            "{},{:.4},{:.4},{},{},{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4}",
            d.date,
            d.close_price,
            d.pre_close,
            d.trade_count,
            d.start_pos,
            d.end_pos,
            d.turnover,
            d.commission,
            d.slippage,
            d.trading_pnl,
            d.holding_pnl,
            d.total_pnl,
            d.net_pnl
        )?;
    }

    Ok(())
}

pub fn write_statistics_json(path: &Path, report: &BacktestReport) -> Result<()> {
    let json = serde_json::to_string_pretty(&report.statistics)
        .context("Failed to serialize statistics")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write statistics JSON {}", path.display()))?;
    Ok(())
}

/// Write the full report into a directory: round trips, daily ledger and
/// statistics.
pub fn write_report(dir: &Path, report: &BacktestReport) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report directory {}", dir.display()))?;
    write_results_csv(&dir.join("results.csv"), &report.results)?;
    write_daily_csv(&dir.join("daily.csv"), &report.daily)?;
    write_statistics_json(&dir.join("statistics.json"), report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::BacktestStatistics;
    use chrono::{NaiveDate, NaiveDateTime};

    fn report() -> BacktestReport {
        let dt = NaiveDateTime::default();
        BacktestReport {
            results: vec![TradingResult {
                strategy: "s".into(),
                entry_price: 100.0,
                entry_time: dt,
                exit_price: 105.0,
                exit_time: dt,
                volume: 1.0,
                turnover: 205.0,
                commission: 0.2,
                slippage: 0.4,
                pnl: 4.4,
                pnl_pct: 0.044,
            }],
            daily: vec![DailyResult {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                close_price: 105.0,
                pre_close: 105.0,
                trade_count: 1,
                start_pos: 0.0,
                end_pos: 1.0,
                turnover: 100.0,
                commission: 0.2,
                slippage: 0.4,
                trading_pnl: 5.0,
                holding_pnl: 0.0,
                total_pnl: 5.0,
                net_pnl: 4.4,
            }],
            statistics: BacktestStatistics::default(),
            trades: Vec::new(),
        }
    }

    #[test]
    fn writes_all_report_files() {
        let dir = tempfile::tempdir().unwrap();
        write_report(dir.path(), &report()).unwrap();

        let results = std::fs::read_to_string(dir.path().join("results.csv")).unwrap();
        assert!(results.starts_with("strategy,entry_time"));
        assert_eq!(results.lines().count(), 2);

        let daily = std::fs::read_to_string(dir.path().join("daily.csv")).unwrap();
        assert!(daily.contains("2024-01-02"));

        let stats = std::fs::read_to_string(dir.path().join("statistics.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&stats).unwrap();
        assert!(parsed.get("sharpe_ratio").is_some());
    }
}
