//! AlignedRow: one matched (series A, series B) sample on the canonical timeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::point::Quote;

/// A row on the shared canonical timeline.
///
/// Rows are only ever built from a real match; unmatched samples are
/// dropped upstream, never filled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    pub canonical_time: DateTime<Utc>,
    pub probability_a: f64,
    pub quote: Quote,
}

impl AlignedRow {
    pub fn new(canonical_time: DateTime<Utc>, probability_a: f64, quote: Quote) -> Self {
        Self {
            canonical_time,
            probability_a,
            quote,
        }
    }

    pub fn probability_b_mid(&self) -> f64 {
        self.quote.mid()
    }

    pub fn probability_b_bid(&self) -> Option<f64> {
        self.quote.bid()
    }

    pub fn probability_b_ask(&self) -> Option<f64> {
        self.quote.ask()
    }

    /// Marks a synthesized mid with no observed spread.
    pub fn is_estimated(&self) -> bool {
        self.quote.is_estimated()
    }

    /// Signed divergence: series A minus the market mid.
    pub fn divergence(&self) -> f64 {
        self.probability_a - self.quote.mid()
    }
}
