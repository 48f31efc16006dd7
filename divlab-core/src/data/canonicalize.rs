//! Canonicalization of raw input series.
//!
//! Upstream timestamps are not trusted to be monotonic. Both series are
//! stable-sorted by timestamp, exact duplicates are collapsed, and anything
//! that cannot be corrected unambiguously is rejected so the game can be
//! marked unsimulatable.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{Quote, QuotePoint, RawPoint};

/// Which input series an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    A,
    B,
}

impl std::fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesKind::A => write!(f, "series A"),
            SeriesKind::B => write!(f, "series B"),
        }
    }
}

/// Input that cannot be repaired by re-sorting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CanonicalError {
    #[error("{series}: probability {value} at {timestamp} is outside [0, 1]")]
    InvalidProbability {
        series: SeriesKind,
        timestamp: DateTime<Utc>,
        value: f64,
    },
    #[error("series B: crossed quote at {timestamp} (bid {bid} > ask {ask})")]
    CrossedQuote {
        timestamp: DateTime<Utc>,
        bid: f64,
        ask: f64,
    },
    #[error("{series}: conflicting samples share timestamp {timestamp}")]
    ConflictingDuplicate {
        series: SeriesKind,
        timestamp: DateTime<Utc>,
    },
}

/// A sorted, deduplicated series plus what it took to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct Canonical<T> {
    pub points: Vec<T>,
    /// Samples whose timestamp regressed relative to the previous sample.
    pub out_of_order: usize,
    /// Exact duplicates removed.
    pub duplicates: usize,
}

fn is_probability(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Sort and validate series A.
pub fn canonicalize_probabilities(
    points: &[RawPoint],
) -> Result<Canonical<RawPoint>, CanonicalError> {
    for p in points {
        if !is_probability(p.value) {
            return Err(CanonicalError::InvalidProbability {
                series: SeriesKind::A,
                timestamp: p.timestamp,
                value: p.value,
            });
        }
    }
    sort_dedupe(points, |p| p.timestamp, SeriesKind::A)
}

/// Sort and validate series B.
pub fn canonicalize_quotes(points: &[QuotePoint]) -> Result<Canonical<QuotePoint>, CanonicalError> {
    for p in points {
        match p.quote {
            Quote::TwoSided { bid, ask } => {
                for value in [bid, ask] {
                    if !is_probability(value) {
                        return Err(CanonicalError::InvalidProbability {
                            series: SeriesKind::B,
                            timestamp: p.timestamp,
                            value,
                        });
                    }
                }
                if bid > ask {
                    return Err(CanonicalError::CrossedQuote {
                        timestamp: p.timestamp,
                        bid,
                        ask,
                    });
                }
            }
            Quote::EstimatedMid { mid } => {
                if !is_probability(mid) {
                    return Err(CanonicalError::InvalidProbability {
                        series: SeriesKind::B,
                        timestamp: p.timestamp,
                        value: mid,
                    });
                }
            }
        }
    }
    sort_dedupe(points, |p| p.timestamp, SeriesKind::B)
}

fn sort_dedupe<T, F>(points: &[T], key: F, series: SeriesKind) -> Result<Canonical<T>, CanonicalError>
where
    T: Clone + PartialEq,
    F: Fn(&T) -> DateTime<Utc>,
{
    let out_of_order = points
        .windows(2)
        .filter(|w| key(&w[1]) < key(&w[0]))
        .count();

    let mut sorted = points.to_vec();
    // Stable: equal timestamps keep caller order for the duplicate check.
    sorted.sort_by_key(|p| key(p));

    let mut deduped: Vec<T> = Vec::with_capacity(sorted.len());
    let mut duplicates = 0;
    for p in sorted {
        match deduped.last() {
            Some(prev) if key(prev) == key(&p) => {
                if *prev != p {
                    return Err(CanonicalError::ConflictingDuplicate {
                        series,
                        timestamp: key(&p),
                    });
                }
                duplicates += 1;
            }
            _ => deduped.push(p),
        }
    }

    Ok(Canonical {
        points: deduped,
        out_of_order,
        duplicates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 19, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn canonicalize_sorts_data() {
        let points = vec![
            RawPoint::new(t(60), 0.3),
            RawPoint::new(t(0), 0.1),
            RawPoint::new(t(30), 0.2),
        ];
        let canonical = canonicalize_probabilities(&points).unwrap();
        let times: Vec<_> = canonical.points.iter().map(|p| p.timestamp).collect();
        assert_eq!(times, vec![t(0), t(30), t(60)]);
        assert_eq!(canonical.out_of_order, 1);
        assert_eq!(canonical.duplicates, 0);
    }

    #[test]
    fn canonicalize_removes_exact_duplicates() {
        let points = vec![
            RawPoint::new(t(0), 0.1),
            RawPoint::new(t(0), 0.1),
            RawPoint::new(t(30), 0.2),
        ];
        let canonical = canonicalize_probabilities(&points).unwrap();
        assert_eq!(canonical.points.len(), 2);
        assert_eq!(canonical.duplicates, 1);
    }

    #[test]
    fn conflicting_duplicates_rejected() {
        let points = vec![RawPoint::new(t(0), 0.1), RawPoint::new(t(0), 0.2)];
        assert_eq!(
            canonicalize_probabilities(&points),
            Err(CanonicalError::ConflictingDuplicate {
                series: SeriesKind::A,
                timestamp: t(0)
            })
        );
    }

    #[test]
    fn crossed_quote_rejected() {
        let points = vec![QuotePoint::two_sided(t(0), 0.55, 0.50)];
        assert!(matches!(
            canonicalize_quotes(&points),
            Err(CanonicalError::CrossedQuote { .. })
        ));
    }

    #[test]
    fn out_of_range_probability_rejected() {
        let points = vec![RawPoint::new(t(0), 1.2)];
        assert!(matches!(
            canonicalize_probabilities(&points),
            Err(CanonicalError::InvalidProbability { series: SeriesKind::A, .. })
        ));

        let quotes = vec![QuotePoint::estimated(t(0), f64::NAN)];
        assert!(matches!(
            canonicalize_quotes(&quotes),
            Err(CanonicalError::InvalidProbability { series: SeriesKind::B, .. })
        ));
    }

    #[test]
    fn quotes_sorted_with_mixed_variants() {
        let points = vec![
            QuotePoint::estimated(t(90), 0.52),
            QuotePoint::two_sided(t(0), 0.48, 0.50),
        ];
        let canonical = canonicalize_quotes(&points).unwrap();
        assert_eq!(canonical.points[0].timestamp, t(0));
        assert!(canonical.points[1].quote.is_estimated());
    }
}
