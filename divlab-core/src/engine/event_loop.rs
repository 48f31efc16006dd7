//! Per-game simulation: a strictly sequential fold over aligned rows.
//!
//! Rows are re-sorted by canonical time before anything else; caller order is
//! never trusted. The fold keeps at most one open position, appends a trade to
//! the ledger on every exit, and force-closes whatever is still open on the
//! last row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SimConfig;
use crate::domain::{AlignedRow, Position, TradeLedger};
use crate::engine::execution::PricingModel;
use crate::engine::state::{evaluate_signal, Signal, Thresholds};

/// Rows the state machine refuses to run on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("two rows share canonical time {0}")]
    DuplicateTime(DateTime<Utc>),
    #[error("non-finite divergence at {0}")]
    NonFiniteDivergence(DateTime<Utc>),
}

/// Counters gathered during one game's fold. Reported, never decision-relevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    pub rows: usize,
    /// Rows that arrived out of canonical-time order and were re-sorted.
    pub resorted_rows: usize,
    pub estimated_rows: usize,
    pub entries: usize,
    pub exits: usize,
    pub forced_closes: usize,
    /// Entry signals skipped because sizing was undefined at the price.
    pub degenerate_entries: usize,
    /// Entry signals on the final row, where nothing is left to hold through.
    #[serde(default)]
    pub suppressed_entries: usize,
    /// Rows where long and short entry fired together.
    pub anomalies: usize,
}

/// Ledger plus counters for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub ledger: TradeLedger,
    pub stats: SimStats,
}

/// Runs the divergence state machine for one configuration.
///
/// Holds only immutable configuration, so one instance can be shared across
/// worker threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simulator {
    thresholds: Thresholds,
    pricing: PricingModel,
}

impl Simulator {
    /// The caller is expected to have validated `config`.
    pub fn new(config: &SimConfig) -> Self {
        Self {
            thresholds: Thresholds::from_config(config),
            pricing: PricingModel::from_config(config),
        }
    }

    pub fn pricing(&self) -> &PricingModel {
        &self.pricing
    }

    /// Simulate one game over its aligned rows.
    pub fn run(&self, game_id: &str, rows: &[AlignedRow]) -> Result<SimulationOutcome, SimError> {
        let resorted_rows = rows
            .windows(2)
            .filter(|w| w[1].canonical_time < w[0].canonical_time)
            .count();
        let mut rows = rows.to_vec();
        rows.sort_by_key(|r| r.canonical_time);
        if let Some(w) = rows
            .windows(2)
            .find(|w| w[0].canonical_time == w[1].canonical_time)
        {
            return Err(SimError::DuplicateTime(w[0].canonical_time));
        }
        if resorted_rows > 0 {
            warn!(game_id, resorted_rows, "aligned rows arrived out of order; re-sorted");
        }

        let mut ledger = TradeLedger::new(game_id);
        let mut stats = SimStats {
            rows: rows.len(),
            resorted_rows,
            estimated_rows: rows.iter().filter(|r| r.is_estimated()).count(),
            ..SimStats::default()
        };
        let mut position: Option<Position> = None;
        let mut prev_divergence: Option<f64> = None;
        let last_index = rows.len().saturating_sub(1);

        for (i, row) in rows.iter().enumerate() {
            let divergence = row.divergence();
            if !divergence.is_finite() {
                return Err(SimError::NonFiniteDivergence(row.canonical_time));
            }

            let signal = evaluate_signal(
                &self.thresholds,
                position.as_ref(),
                prev_divergence,
                divergence,
                row.canonical_time,
            );

            match signal {
                // An entry on the last row would be force-closed on the spot.
                Signal::Enter(direction) if i == last_index => {
                    debug!(
                        game_id,
                        time = %row.canonical_time,
                        %direction,
                        divergence,
                        "entry on last row suppressed"
                    );
                    stats.suppressed_entries += 1;
                }
                Signal::Enter(direction) => match self.pricing.open(direction, row) {
                    Some(opened) => {
                        debug!(
                            game_id,
                            time = %row.canonical_time,
                            %direction,
                            divergence,
                            price = opened.entry_price,
                            contracts = opened.contracts,
                            "enter"
                        );
                        stats.entries += 1;
                        position = Some(opened);
                    }
                    None => {
                        warn!(
                            game_id,
                            time = %row.canonical_time,
                            %direction,
                            "entry skipped: position size undefined at execution price"
                        );
                        stats.degenerate_entries += 1;
                    }
                },
                Signal::Exit => {
                    if let Some(open) = position.take() {
                        let trade = self.pricing.close(&open, row, false);
                        debug!(
                            game_id,
                            time = %row.canonical_time,
                            divergence,
                            net_profit = trade.net_profit,
                            "exit"
                        );
                        stats.exits += 1;
                        ledger.push(trade);
                    }
                }
                Signal::Conflict => {
                    warn!(
                        game_id,
                        time = %row.canonical_time,
                        divergence,
                        "long and short entry fired on the same row; no action"
                    );
                    stats.anomalies += 1;
                }
                Signal::Hold => {}
            }

            prev_divergence = Some(divergence);
        }

        if let (Some(open), Some(last)) = (position.take(), rows.last()) {
            let trade = self.pricing.close(&open, last, true);
            debug!(
                game_id,
                time = %last.canonical_time,
                net_profit = trade.net_profit,
                "forced close at end of data"
            );
            stats.forced_closes += 1;
            ledger.push(trade);
        }

        Ok(SimulationOutcome { ledger, stats })
    }
}

/// Convenience wrapper: simulate one game with a fresh `Simulator`.
pub fn simulate_game(
    game_id: &str,
    rows: &[AlignedRow],
    config: &SimConfig,
) -> Result<SimulationOutcome, SimError> {
    Simulator::new(config).run(game_id, rows)
}
