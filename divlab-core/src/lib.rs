//! divlab core: domain types, alignment, and the divergence state machine.
//!
//! This crate contains the pure simulation core:
//! - Domain types (raw samples, quotes, aligned rows, positions, trades, ledgers)
//! - Configuration with eager validation
//! - Canonicalization of untrusted input order
//! - Series alignment onto a canonical timeline
//! - Pricing with two-sided execution, convex fees, slippage and sizing
//! - The per-game entry/exit state machine
//! - Content fingerprints for result caching
//!
//! Nothing here performs I/O or holds mutable global state.

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod sizers;

pub use config::{ConfigError, SimConfig};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything handed to worker threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::RawPoint>();
        require_sync::<domain::RawPoint>();
        require_send::<domain::QuotePoint>();
        require_sync::<domain::QuotePoint>();
        require_send::<domain::AlignedRow>();
        require_sync::<domain::AlignedRow>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::TradeLedger>();
        require_sync::<domain::TradeLedger>();
        require_send::<domain::CacheKey>();
        require_sync::<domain::CacheKey>();

        require_send::<SimConfig>();
        require_sync::<SimConfig>();
        require_send::<data::Alignment>();
        require_sync::<data::Alignment>();
        require_send::<engine::Simulator>();
        require_sync::<engine::Simulator>();
        require_send::<engine::SimulationOutcome>();
        require_sync::<engine::SimulationOutcome>();
    }

    /// The state machine sees only the position, the previous divergence and
    /// the current row. If a ledger or portfolio parameter is ever added, this
    /// stops compiling.
    #[test]
    fn signal_evaluation_has_no_history_parameter() {
        fn _check(
            thresholds: &engine::Thresholds,
            position: Option<&domain::Position>,
            now: chrono::DateTime<chrono::Utc>,
        ) -> engine::Signal {
            engine::evaluate_signal(thresholds, position, Some(0.0), 0.0, now)
        }
    }
}
