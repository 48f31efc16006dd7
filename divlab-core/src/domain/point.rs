//! Raw input samples: series A probabilities and series B market quotes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sample of the model-side probability series (series A).
///
/// Produced externally and immutable once read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl RawPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// A market quote for the binary outcome.
///
/// Some history only carries a single traded price; that is kept distinct
/// from a real two-sided book so pricing can apply a synthetic spread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Quote {
    TwoSided { bid: f64, ask: f64 },
    EstimatedMid { mid: f64 },
}

impl Quote {
    pub fn mid(&self) -> f64 {
        match *self {
            Quote::TwoSided { bid, ask } => (bid + ask) / 2.0,
            Quote::EstimatedMid { mid } => mid,
        }
    }

    /// Observed bid, if the quote is two-sided.
    pub fn bid(&self) -> Option<f64> {
        match *self {
            Quote::TwoSided { bid, .. } => Some(bid),
            Quote::EstimatedMid { .. } => None,
        }
    }

    /// Observed ask, if the quote is two-sided.
    pub fn ask(&self) -> Option<f64> {
        match *self {
            Quote::TwoSided { ask, .. } => Some(ask),
            Quote::EstimatedMid { .. } => None,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, Quote::EstimatedMid { .. })
    }
}

/// One sample of the market series (series B).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuotePoint {
    pub timestamp: DateTime<Utc>,
    pub quote: Quote,
}

impl QuotePoint {
    pub fn two_sided(timestamp: DateTime<Utc>, bid: f64, ask: f64) -> Self {
        Self {
            timestamp,
            quote: Quote::TwoSided { bid, ask },
        }
    }

    pub fn estimated(timestamp: DateTime<Utc>, mid: f64) -> Self {
        Self {
            timestamp,
            quote: Quote::EstimatedMid { mid },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_sided_mid_is_midpoint() {
        let q = Quote::TwoSided { bid: 0.48, ask: 0.52 };
        assert!((q.mid() - 0.50).abs() < 1e-12);
        assert_eq!(q.bid(), Some(0.48));
        assert_eq!(q.ask(), Some(0.52));
        assert!(!q.is_estimated());
    }

    #[test]
    fn estimated_quote_has_no_book_sides() {
        let q = Quote::EstimatedMid { mid: 0.61 };
        assert_eq!(q.mid(), 0.61);
        assert_eq!(q.bid(), None);
        assert_eq!(q.ask(), None);
        assert!(q.is_estimated());
    }

    #[test]
    fn quote_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Quote::EstimatedMid { mid: 0.5 }).unwrap();
        assert_eq!(json, r#"{"kind":"estimated_mid","mid":0.5}"#);
    }
}
