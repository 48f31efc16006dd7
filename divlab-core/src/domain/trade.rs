//! Trade: an immutable closed position.

use super::position::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed (or forced-closed) round trip.
///
/// Built once when a position closes and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub direction: Direction,

    // ── Entry ──
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub entry_divergence: f64,

    // ── Exit ──
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_divergence: f64,

    // ── Size ──
    pub contracts: f64,

    // ── Profit ──
    pub gross_profit: f64,
    /// Entry plus exit fee.
    pub fees: f64,
    /// Entry plus exit slippage.
    pub slippage: f64,
    pub net_profit: f64,

    /// Closed because the data ran out, not because an exit fired.
    pub forced_close: bool,
    /// Either leg was priced off a synthesized spread.
    pub estimated_quote: bool,
}

impl Trade {
    pub fn hold_secs(&self) -> f64 {
        (self.exit_time - self.entry_time).num_milliseconds() as f64 / 1000.0
    }

    pub fn is_winner(&self) -> bool {
        self.net_profit > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.net_profit < 0.0
    }
}
