//! Series alignment onto one canonical timeline.
//!
//! Series A's recording clock starts late, so its timestamps are re-based onto
//! the real game start by preserving elapsed time since its first sample. Each
//! re-based A sample is then paired with the nearest series B sample inside
//! the game window. Pairs further apart than [`MATCH_TOLERANCE_MS`] are
//! dropped; nothing is ever forward-filled.

use std::borrow::Cow;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AlignedRow, QuotePoint, RawPoint};

/// Maximum distance between a series A sample and its matched quote.
pub const MATCH_TOLERANCE_MS: i64 = 60_000;

/// Rows on the canonical timeline plus alignment bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    pub rows: Vec<AlignedRow>,
    /// Series A samples with no quote within tolerance.
    pub dropped: usize,
    /// Series B samples inside `[game_start, game_start + A duration]`.
    pub quotes_in_window: usize,
}

impl AlignedSeries {
    pub fn estimated_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.is_estimated()).count()
    }
}

/// Outcome of aligning one game's inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Alignment {
    /// Series A was empty: nothing to simulate.
    EmptySeriesA,
    /// No series B sample fell inside the game window.
    NoMarketData { samples_a: usize },
    Aligned(AlignedSeries),
}

/// Align two series onto the canonical timeline.
///
/// Input order is not trusted: either slice that is not ascending by timestamp
/// is stably re-sorted on a private copy first. Already ascending input (the
/// output of canonicalization) is used as is and aligned with a two-pointer
/// sweep, O(n + m).
pub fn align_series(
    series_a: &[RawPoint],
    series_b: &[QuotePoint],
    game_start: DateTime<Utc>,
) -> Alignment {
    let series_a = ascending(series_a, |p| p.timestamp);
    let series_b = ascending(series_b, |q| q.timestamp);

    let (first, last) = match (series_a.first(), series_a.last()) {
        (Some(first), Some(last)) => (first.timestamp, last.timestamp),
        _ => return Alignment::EmptySeriesA,
    };

    let offset = game_start - first;
    let window_end = game_start + (last - first);

    let window: Vec<&QuotePoint> = series_b
        .iter()
        .filter(|q| q.timestamp >= game_start && q.timestamp <= window_end)
        .collect();
    if window.is_empty() {
        return Alignment::NoMarketData {
            samples_a: series_a.len(),
        };
    }

    let tolerance = Duration::milliseconds(MATCH_TOLERANCE_MS);
    let mut rows = Vec::with_capacity(series_a.len());
    let mut dropped = 0;
    let mut j = 0;

    for point in series_a.iter() {
        let t = point.timestamp + offset;
        while j + 1 < window.len() && window[j + 1].timestamp <= t {
            j += 1;
        }
        let nearest = nearest_quote(&window, j, t);
        if (nearest.timestamp - t).abs() <= tolerance {
            rows.push(AlignedRow::new(t, point.value, nearest.quote));
        } else {
            dropped += 1;
        }
    }

    Alignment::Aligned(AlignedSeries {
        rows,
        dropped,
        quotes_in_window: window.len(),
    })
}

/// Borrow `points` when already ascending, otherwise a stably sorted copy.
fn ascending<T, F>(points: &[T], key: F) -> Cow<'_, [T]>
where
    T: Clone,
    F: Fn(&T) -> DateTime<Utc>,
{
    if points.windows(2).all(|w| key(&w[0]) <= key(&w[1])) {
        Cow::Borrowed(points)
    } else {
        let mut sorted = points.to_vec();
        sorted.sort_by_key(&key);
        Cow::Owned(sorted)
    }
}

/// Nearest of `window[j]` and `window[j + 1]` to `t`; ties go to the earlier quote.
fn nearest_quote<'a>(window: &[&'a QuotePoint], j: usize, t: DateTime<Utc>) -> &'a QuotePoint {
    let here = window[j];
    match window.get(j + 1) {
        Some(next) if (next.timestamp - t).abs() < (here.timestamp - t).abs() => next,
        _ => here,
    }
}

/// Drop rows inside the leading/trailing exclusion windows.
///
/// The leading window is measured from `game_start`, the trailing window back
/// from the last aligned row. Returns the kept rows and how many were removed.
pub fn apply_exclusion_windows(
    rows: Vec<AlignedRow>,
    game_start: DateTime<Utc>,
    leading_secs: u64,
    trailing_secs: u64,
) -> (Vec<AlignedRow>, usize) {
    let Some(last) = rows.last().map(|r| r.canonical_time) else {
        return (rows, 0);
    };
    let before = rows.len();
    let bounds = shift(game_start, leading_secs, true).zip(shift(last, trailing_secs, false));
    let Some((from, until)) = bounds else {
        // A window beyond the representable time range excludes everything.
        return (Vec::new(), before);
    };

    let kept: Vec<AlignedRow> = rows
        .into_iter()
        .filter(|r| r.canonical_time >= from && r.canonical_time <= until)
        .collect();
    let excluded = before - kept.len();
    (kept, excluded)
}

fn shift(t: DateTime<Utc>, secs: u64, forward: bool) -> Option<DateTime<Utc>> {
    let d = Duration::from_std(std::time::Duration::from_secs(secs)).ok()?;
    if forward {
        t.checked_add_signed(d)
    } else {
        t.checked_sub_signed(d)
    }
}
