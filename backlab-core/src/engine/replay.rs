//! Replay driver: merges per-instrument chronological sequences into one
//! deterministic stream.
//!
//! Ties between streams are broken by registration order, so the same set
//! of inputs always yields the same merged sequence.

use crate::domain::{Bar, Tick};
use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors from stream validation.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("stream {0} is empty")]
    EmptyStream(usize),

    #[error("stream {stream} is not chronological at index {index}: {prev} then {next}")]
    NonMonotonic {
        stream: usize,
        index: usize,
        prev: NaiveDateTime,
        next: NaiveDateTime,
    },

    #[error("no data points between {start} and {end}")]
    EmptyWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

fn check_stream<T>(
    idx: usize,
    items: &[T],
    ts: impl Fn(&T) -> NaiveDateTime,
) -> Result<(), ReplayError> {
    if items.is_empty() {
        return Err(ReplayError::EmptyStream(idx));
    }
    for (i, pair) in items.windows(2).enumerate() {
        let (prev, next) = (ts(&pair[0]), ts(&pair[1]));
        if next < prev {
            return Err(ReplayError::NonMonotonic {
                stream: idx,
                index: i + 1,
                prev,
                next,
            });
        }
    }
    Ok(())
}

/// K-way merge by timestamp. Equal timestamps drain in stream
/// registration order.
fn merge_streams<T: Clone>(
    streams: &[Vec<T>],
    ts: impl Fn(&T) -> NaiveDateTime + Copy,
) -> Result<Vec<T>, ReplayError> {
    for (idx, stream) in streams.iter().enumerate() {
        check_stream(idx, stream, ts)?;
    }

    let total: usize = streams.iter().map(Vec::len).sum();
    let mut cursors = vec![0usize; streams.len()];
    let mut merged = Vec::with_capacity(total);

    while merged.len() < total {
        let mut best: Option<(usize, NaiveDateTime)> = None;
        for (idx, stream) in streams.iter().enumerate() {
            if cursors[idx] >= stream.len() {
                continue;
            }
            let t = ts(&stream[cursors[idx]]);
            // Strict < keeps the earlier-registered stream on ties.
            if best.map_or(true, |(_, bt)| t < bt) {
                best = Some((idx, t));
            }
        }
        // total accounting guarantees a live cursor exists
        let (idx, _) = best.ok_or(ReplayError::EmptyStream(0))?;
        merged.push(streams[idx][cursors[idx]].clone());
        cursors[idx] += 1;
    }

    Ok(merged)
}

/// Validate one bar sequence: non-empty, chronological, and with at
/// least one data point inside `[start, end]`.
pub fn validate_bars(
    bars: &[Bar],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<(), ReplayError> {
    check_stream(0, bars, |b: &Bar| b.datetime)?;
    check_window(bars, |b: &Bar| b.datetime, start, end)
}

/// Validate one tick sequence the same way.
pub fn validate_ticks(
    ticks: &[Tick],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<(), ReplayError> {
    check_stream(0, ticks, |t: &Tick| t.datetime)?;
    check_window(ticks, |t: &Tick| t.datetime, start, end)
}

fn check_window<T>(
    items: &[T],
    ts: impl Fn(&T) -> NaiveDateTime,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<(), ReplayError> {
    if items.iter().any(|item| {
        let t = ts(item);
        t >= start && t <= end
    }) {
        Ok(())
    } else {
        Err(ReplayError::EmptyWindow { start, end })
    }
}

/// Merge bar streams into one chronological sequence.
pub fn merge_bar_streams(streams: &[Vec<Bar>]) -> Result<Vec<Bar>, ReplayError> {
    merge_streams(streams, |b: &Bar| b.datetime)
}

/// Merge tick streams into one chronological sequence.
pub fn merge_tick_streams(streams: &[Vec<Tick>]) -> Result<Vec<Tick>, ReplayError> {
    merge_streams(streams, |t: &Tick| t.datetime)
}
