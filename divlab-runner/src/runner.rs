//! Per-game runner: wires together canonicalization, alignment, the
//! simulator, and metrics.
//!
//! `run_game()` never fails: every problem with one game's data becomes a
//! [`GameStatus`] on its result so a batch can carry on without it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use divlab_core::data::{
    align_series, apply_exclusion_windows, canonicalize_probabilities, canonicalize_quotes,
    Alignment, CanonicalError,
};
use divlab_core::domain::{ConfigHash, InputHash, QuotePoint, RawPoint, TradeLedger};
use divlab_core::engine::{SimError, Simulator};
use divlab_core::fingerprint::input_hash;
use divlab_core::{ConfigError, SimConfig};

use crate::metrics::TradeMetrics;

/// Errors that abort a whole run before any game is simulated.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// One game's raw inputs, as supplied by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInput {
    pub game_id: String,
    pub game_start: DateTime<Utc>,
    pub series_a: Vec<RawPoint>,
    pub series_b: Vec<QuotePoint>,
}

impl GameInput {
    pub fn new(
        game_id: impl Into<String>,
        game_start: DateTime<Utc>,
        series_a: Vec<RawPoint>,
        series_b: Vec<QuotePoint>,
    ) -> Self {
        Self {
            game_id: game_id.into(),
            game_start,
            series_a,
            series_b,
        }
    }

    pub fn input_hash(&self) -> InputHash {
        input_hash(&self.game_id, self.game_start, &self.series_a, &self.series_b)
    }
}

/// Outcome class of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GameStatus {
    Ok,
    /// The inputs could not be made consistent; the game is excluded.
    Unsimulatable { reason: String },
    /// The simulation itself refused the rows.
    Error { message: String },
}

impl GameStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, GameStatus::Ok)
    }

    pub fn label(&self) -> &'static str {
        match self {
            GameStatus::Ok => "ok",
            GameStatus::Unsimulatable { .. } => "unsimulatable",
            GameStatus::Error { .. } => "error",
        }
    }

    /// Reason or message for non-ok games.
    pub fn detail(&self) -> Option<&str> {
        match self {
            GameStatus::Ok => None,
            GameStatus::Unsimulatable { reason } => Some(reason),
            GameStatus::Error { message } => Some(message),
        }
    }
}

/// Per-game counters. Surfaced to reporting, never decision-relevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDiagnostics {
    pub samples_a: usize,
    pub samples_b: usize,
    /// Raw samples that arrived out of timestamp order and were re-sorted.
    pub out_of_order: usize,
    /// Exact duplicate samples removed.
    pub duplicates_removed: usize,
    /// Series B samples inside the game window.
    pub quotes_in_window: usize,
    pub aligned_rows: usize,
    pub dropped_by_alignment: usize,
    pub excluded_by_window: usize,
    /// Rows actually simulated.
    pub simulated_rows: usize,
    pub estimated_rows: usize,
    pub forced_closes: usize,
    pub degenerate_entries: usize,
    /// Entry signals on the final simulated row.
    #[serde(default)]
    pub suppressed_entries: usize,
    pub anomalies: usize,
    pub no_market_data: bool,
}

/// Complete result of one game under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub game_id: String,
    pub status: GameStatus,
    pub ledger: TradeLedger,
    pub metrics: TradeMetrics,
    pub diagnostics: GameDiagnostics,
    pub input_hash: InputHash,
    pub config_hash: ConfigHash,
}

/// Why a game produced no usable ledger.
#[derive(Debug, Error)]
enum GameFailure {
    #[error(transparent)]
    Input(#[from] CanonicalError),
    #[error("series A is empty")]
    EmptySeriesA,
    #[error(transparent)]
    Simulation(#[from] SimError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl GameFailure {
    fn into_status(self) -> GameStatus {
        match self {
            GameFailure::Input(_) | GameFailure::EmptySeriesA => GameStatus::Unsimulatable {
                reason: self.to_string(),
            },
            GameFailure::Simulation(_) | GameFailure::Config(_) => GameStatus::Error {
                message: self.to_string(),
            },
        }
    }
}

/// Run one game: canonicalize, align, drop exclusion windows, simulate, measure.
pub fn run_game(input: &GameInput, config: &SimConfig) -> GameResult {
    match config.validate() {
        Ok(()) => run_validated(input, config),
        Err(e) => finish(
            input,
            config,
            Err(GameFailure::Config(e)),
            GameDiagnostics::default(),
        ),
    }
}

/// `run_game` for a configuration the caller has already validated.
pub(crate) fn run_validated(input: &GameInput, config: &SimConfig) -> GameResult {
    let mut diagnostics = GameDiagnostics {
        samples_a: input.series_a.len(),
        samples_b: input.series_b.len(),
        ..GameDiagnostics::default()
    };
    let outcome = simulate(input, config, &mut diagnostics);
    finish(input, config, outcome, diagnostics)
}

fn simulate(
    input: &GameInput,
    config: &SimConfig,
    diagnostics: &mut GameDiagnostics,
) -> Result<TradeLedger, GameFailure> {
    let series_a = canonicalize_probabilities(&input.series_a)?;
    let series_b = canonicalize_quotes(&input.series_b)?;
    diagnostics.out_of_order = series_a.out_of_order + series_b.out_of_order;
    diagnostics.duplicates_removed = series_a.duplicates + series_b.duplicates;
    if diagnostics.out_of_order > 0 {
        warn!(
            game_id = %input.game_id,
            out_of_order = diagnostics.out_of_order,
            "input samples arrived out of order; re-sorted"
        );
    }

    let aligned = match align_series(&series_a.points, &series_b.points, input.game_start) {
        Alignment::EmptySeriesA => return Err(GameFailure::EmptySeriesA),
        Alignment::NoMarketData { .. } => {
            debug!(game_id = %input.game_id, "no market data inside the game window");
            diagnostics.no_market_data = true;
            return Ok(TradeLedger::new(input.game_id.clone()));
        }
        Alignment::Aligned(aligned) => aligned,
    };
    diagnostics.quotes_in_window = aligned.quotes_in_window;
    diagnostics.aligned_rows = aligned.rows.len();
    diagnostics.dropped_by_alignment = aligned.dropped;

    let (rows, excluded) = apply_exclusion_windows(
        aligned.rows,
        input.game_start,
        config.exclude_leading_secs,
        config.exclude_trailing_secs,
    );
    diagnostics.excluded_by_window = excluded;

    let outcome = Simulator::new(config).run(&input.game_id, &rows)?;
    diagnostics.simulated_rows = outcome.stats.rows;
    diagnostics.estimated_rows = outcome.stats.estimated_rows;
    diagnostics.forced_closes = outcome.stats.forced_closes;
    diagnostics.degenerate_entries = outcome.stats.degenerate_entries;
    diagnostics.suppressed_entries = outcome.stats.suppressed_entries;
    diagnostics.anomalies = outcome.stats.anomalies;
    Ok(outcome.ledger)
}

fn finish(
    input: &GameInput,
    config: &SimConfig,
    outcome: Result<TradeLedger, GameFailure>,
    diagnostics: GameDiagnostics,
) -> GameResult {
    let (status, ledger) = match outcome {
        Ok(ledger) => (GameStatus::Ok, ledger),
        Err(failure) => {
            let status = failure.into_status();
            warn!(
                game_id = %input.game_id,
                status = status.label(),
                detail = status.detail().unwrap_or_default(),
                "game excluded"
            );
            (status, TradeLedger::new(input.game_id.clone()))
        }
    };

    GameResult {
        schema_version: SCHEMA_VERSION,
        game_id: input.game_id.clone(),
        metrics: TradeMetrics::compute(ledger.trades()),
        status,
        ledger,
        diagnostics,
        input_hash: input.input_hash(),
        config_hash: config.config_hash(),
    }
}
