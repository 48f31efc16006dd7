//! Parallel batch runner.
//!
//! Games are independent, so they fan out across the rayon pool; each game's
//! own fold stays sequential. Results come back in input order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use divlab_core::domain::ConfigHash;
use divlab_core::fingerprint::cache_key;
use divlab_core::SimConfig;

use crate::cache::ResultCache;
use crate::metrics::TradeMetrics;
use crate::runner::{run_validated, GameInput, GameResult, GameStatus, RunError, SCHEMA_VERSION};

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Every game's result plus aggregates over the `Ok` games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub config: SimConfig,
    pub config_hash: ConfigHash,
    /// In input order.
    pub games: Vec<GameResult>,
    /// Computed over `Ok` games only.
    pub aggregate: TradeMetrics,
    pub ok_games: usize,
    pub unsimulatable_games: usize,
    pub error_games: usize,
    #[serde(default)]
    pub cache_hits: usize,
}

impl BatchResult {
    fn from_games(config: &SimConfig, games: Vec<GameResult>, cache_hits: usize) -> Self {
        let mut ok_games = 0;
        let mut unsimulatable_games = 0;
        let mut error_games = 0;
        for game in &games {
            match game.status {
                GameStatus::Ok => ok_games += 1,
                GameStatus::Unsimulatable { .. } => unsimulatable_games += 1,
                GameStatus::Error { .. } => error_games += 1,
            }
        }
        let aggregate = TradeMetrics::from_ledgers(
            games
                .iter()
                .filter(|g| g.status.is_ok())
                .map(|g| &g.ledger),
        );

        info!(
            games = games.len(),
            ok = ok_games,
            unsimulatable = unsimulatable_games,
            error = error_games,
            cache_hits,
            trades = aggregate.totals.trade_count,
            net_profit = aggregate.totals.net_profit,
            "batch complete"
        );

        Self {
            schema_version: SCHEMA_VERSION,
            config: config.clone(),
            config_hash: config.config_hash(),
            games,
            aggregate,
            ok_games,
            unsimulatable_games,
            error_games,
            cache_hits,
        }
    }

    /// Games left out of the aggregate.
    pub fn excluded_games(&self) -> usize {
        self.unsimulatable_games + self.error_games
    }

    pub fn ok_results(&self) -> impl Iterator<Item = &GameResult> {
        self.games.iter().filter(|g| g.status.is_ok())
    }
}

/// Validate `config` once, then run every game in parallel.
pub fn run_batch(games: &[GameInput], config: &SimConfig) -> Result<BatchResult, RunError> {
    config.validate()?;
    let results: Vec<GameResult> = games
        .par_iter()
        .map(|game| run_validated(game, config))
        .collect();
    Ok(BatchResult::from_games(config, results, 0))
}

/// `run_batch`, consulting `cache` before simulating each game.
///
/// Cache failures are logged and the game is computed normally; a batch never
/// fails because of its cache.
pub fn run_batch_cached(
    games: &[GameInput],
    config: &SimConfig,
    cache: &dyn ResultCache,
) -> Result<BatchResult, RunError> {
    config.validate()?;
    let results: Vec<(GameResult, bool)> = games
        .par_iter()
        .map(|game| run_with_cache(game, config, cache))
        .collect();
    let cache_hits = results.iter().filter(|(_, hit)| *hit).count();
    let results = results.into_iter().map(|(result, _)| result).collect();
    Ok(BatchResult::from_games(config, results, cache_hits))
}

fn run_with_cache(
    game: &GameInput,
    config: &SimConfig,
    cache: &dyn ResultCache,
) -> (GameResult, bool) {
    let key = cache_key(game.input_hash(), config);
    match cache.get(&key) {
        Ok(Some(hit)) => return (hit, true),
        Ok(None) => {}
        Err(e) => warn!(game_id = %game.game_id, %key, error = %e, "cache read failed"),
    }

    let result = run_validated(game, config);
    if let Err(e) = cache.put(&key, &result) {
        warn!(game_id = %game.game_id, %key, error = %e, "cache write failed");
    }
    (result, false)
}
