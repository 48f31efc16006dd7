//! CSV loading for the two input series.
//!
//! - Series A: header `timestamp,probability`.
//! - Series B: header `timestamp,bid,ask,mid`. A row with both `bid` and `ask`
//!   is a two-sided quote; a row with only `mid` is an estimated mid. Anything
//!   else is rejected.
//!
//! Timestamps are RFC 3339. Rows are returned in file order; sorting and
//! validation happen later, at the canonicalization boundary.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use divlab_core::domain::{QuotePoint, RawPoint};

use crate::config::{BacktestConfig, GameSpec};
use crate::runner::GameInput;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path}, line {line}: need both bid and ask, or mid alone")]
    IncompleteQuote { path: PathBuf, line: usize },
}

#[derive(Debug, Deserialize)]
struct SeriesARecord {
    timestamp: DateTime<Utc>,
    probability: f64,
}

#[derive(Debug, Deserialize)]
struct SeriesBRecord {
    timestamp: DateTime<Utc>,
    bid: Option<f64>,
    ask: Option<f64>,
    mid: Option<f64>,
}

impl SeriesBRecord {
    fn into_point(self) -> Option<QuotePoint> {
        match (self.bid, self.ask, self.mid) {
            (Some(bid), Some(ask), _) => Some(QuotePoint::two_sided(self.timestamp, bid, ask)),
            (None, None, Some(mid)) => Some(QuotePoint::estimated(self.timestamp, mid)),
            _ => None,
        }
    }
}

fn csv_error(path: &Path) -> impl Fn(csv::Error) -> LoadError + '_ {
    move |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Read series A from any reader. `path` only labels errors.
pub fn read_series_a<R: Read>(reader: R, path: &Path) -> Result<Vec<RawPoint>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    rdr.deserialize::<SeriesARecord>()
        .map(|record| {
            record
                .map(|r| RawPoint::new(r.timestamp, r.probability))
                .map_err(csv_error(path))
        })
        .collect()
}

/// Read series B from any reader. `path` only labels errors.
pub fn read_series_b<R: Read>(reader: R, path: &Path) -> Result<Vec<QuotePoint>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut points = Vec::new();
    for (i, record) in rdr.deserialize::<SeriesBRecord>().enumerate() {
        let record = record.map_err(csv_error(path))?;
        let point = record.into_point().ok_or_else(|| LoadError::IncompleteQuote {
            path: path.to_path_buf(),
            // Header is line 1.
            line: i + 2,
        })?;
        points.push(point);
    }
    Ok(points)
}

pub fn load_series_a(path: &Path) -> Result<Vec<RawPoint>, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| csv_error(path)(e.into()))?;
    read_series_a(file, path)
}

pub fn load_series_b(path: &Path) -> Result<Vec<QuotePoint>, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| csv_error(path)(e.into()))?;
    read_series_b(file, path)
}

/// Load both series of one manifest entry.
pub fn load_game(spec: &GameSpec) -> Result<GameInput, LoadError> {
    let series_a = load_series_a(&spec.series_a)?;
    let series_b = load_series_b(&spec.series_b)?;
    debug!(
        game_id = %spec.id,
        samples_a = series_a.len(),
        samples_b = series_b.len(),
        "loaded game"
    );
    Ok(GameInput::new(spec.id.clone(), spec.game_start, series_a, series_b))
}

/// Load every game in the manifest, in manifest order.
pub fn load_games(config: &BacktestConfig) -> Result<Vec<GameInput>, LoadError> {
    config.games.iter().map(load_game).collect()
}
