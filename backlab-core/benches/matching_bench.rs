//! Criterion benchmarks for the replay hot paths.
//!
//! Benchmarks:
//! 1. Limit cross pass over a populated order book
//! 2. Full bar replay with the dual moving-average strategy
//! 3. FIFO pairing of a long fill stream

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use backlab_core::domain::{
    BacktestMode, Bar, CostModel, Direction, Interval, Offset, Trade, TradeId,
};
use backlab_core::domain::OrderId;
use backlab_core::engine::{
    BacktestEngine, CrossPrices, EngineConfig, OrderBook, Warmup,
};
use backlab_core::ledger::pair_trades;
use backlab_core::strategy::DualMaStrategy;
use chrono::{Duration, NaiveDate, NaiveDateTime};

// ── Helpers ──────────────────────────────────────────────────────────

fn base_dt() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn make_bars(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            Bar {
                symbol: "IF888".into(),
                datetime: base_dt() + Duration::minutes(i as i64),
                interval: Interval::Minute,
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1000.0,
                open_interest: 0.0,
            }
        })
        .collect()
}

fn make_fills(n: usize) -> Vec<Trade> {
    (0..n)
        .map(|i| Trade {
            id: TradeId(i as u64 + 1),
            order_id: OrderId(i as u64 + 1),
            symbol: "IF888".into(),
            direction: if i % 2 == 0 {
                Direction::Long
            } else {
                Direction::Short
            },
            offset: Offset::Open,
            price: 100.0 + (i % 7) as f64,
            volume: 1.0 + (i % 3) as f64,
            datetime: base_dt() + Duration::minutes(i as i64),
            strategy: "bench".into(),
        })
        .collect()
}

fn config(n_bars: usize) -> EngineConfig {
    EngineConfig {
        symbol: "IF888".into(),
        interval: Interval::Minute,
        start: base_dt(),
        end: base_dt() + Duration::minutes(n_bars as i64),
        rate: 0.0001,
        slippage: 0.2,
        size: 10.0,
        pricetick: 0.1,
        capital: 1_000_000.0,
        mode: BacktestMode::Bar,
        inverse: false,
        warmup: Warmup::Bars(0),
    }
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_cross_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_limit");
    for n_orders in [10usize, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(n_orders),
            &n_orders,
            |b, &n| {
                let bar = &make_bars(1)[0];
                b.iter_batched(
                    || {
                        let mut book = OrderBook::new();
                        for i in 0..n {
                            // half rest out of range, half fill
                            let price = if i % 2 == 0 { 95.0 } else { 105.0 };
                            book.place_limit(
                                "IF888",
                                Direction::Long,
                                Offset::Open,
                                price,
                                1.0,
                                "bench",
                                base_dt(),
                            );
                        }
                        book
                    },
                    |mut book| {
                        black_box(book.cross_limit(CrossPrices::limit_from_bar(bar), bar.datetime))
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

fn bench_full_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay_dual_ma");
    for n_bars in [1000usize, 10_000] {
        let bars = make_bars(n_bars);
        group.bench_with_input(BenchmarkId::from_parameter(n_bars), &bars, |b, bars| {
            b.iter(|| {
                let engine =
                    BacktestEngine::new(config(bars.len()), DualMaStrategy::new(10, 20));
                black_box(engine.run_bars(bars))
            });
        });
    }
    group.finish();
}

fn bench_pairing(c: &mut Criterion) {
    let fills = make_fills(10_000);
    let cost = CostModel {
        rate: 0.0001,
        slippage: 0.2,
        size: 10.0,
        inverse: false,
    };
    c.bench_function("pair_trades_10k", |b| {
        b.iter(|| {
            black_box(pair_trades(
                &fills,
                &cost,
                100.0,
                base_dt() + Duration::days(1),
            ))
        });
    });
}

criterion_group!(benches, bench_cross_pass, bench_full_replay, bench_pairing);
criterion_main!(benches);
