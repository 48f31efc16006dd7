//! Input canonicalization and series alignment

pub mod align;
pub mod canonicalize;

pub use align::{align_series, apply_exclusion_windows, AlignedSeries, Alignment, MATCH_TOLERANCE_MS};
pub use canonicalize::{
    canonicalize_probabilities, canonicalize_quotes, Canonical, CanonicalError, SeriesKind,
};
