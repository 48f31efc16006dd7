//! Content fingerprints for result caching.
//!
//! - `InputHash`: BLAKE3 over the canonical JSON of one game's raw inputs.
//! - `ConfigHash`: see [`SimConfig::config_hash`].
//! - `CacheKey`: the pair. Identical inputs under an identical configuration
//!   produce bit-identical results, so the pair is a sound cache key.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::SimConfig;
use crate::domain::{CacheKey, InputHash, QuotePoint, RawPoint};

#[derive(Serialize)]
struct GameInputView<'a> {
    game_id: &'a str,
    game_start: DateTime<Utc>,
    series_a: &'a [RawPoint],
    series_b: &'a [QuotePoint],
}

/// Hash one game's raw inputs exactly as supplied, in caller order.
pub fn input_hash(
    game_id: &str,
    game_start: DateTime<Utc>,
    series_a: &[RawPoint],
    series_b: &[QuotePoint],
) -> InputHash {
    let view = GameInputView {
        game_id,
        game_start,
        series_a,
        series_b,
    };
    // Non-finite floats serialize as null; serialization itself cannot fail here.
    let json = serde_json::to_vec(&view).unwrap_or_default();
    InputHash::from_bytes(&json)
}

pub fn cache_key(input_hash: InputHash, config: &SimConfig) -> CacheKey {
    CacheKey::new(input_hash, config.config_hash())
}
