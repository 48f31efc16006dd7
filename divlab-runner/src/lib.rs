//! divlab runner: game orchestration, metrics, caching, and export.
//!
//! This crate builds on `divlab-core` to provide:
//! - The per-game pipeline with status isolation (`run_game`)
//! - Parallel batches over many games (`run_batch`, `run_batch_cached`)
//! - Portfolio metrics over trade ledgers
//! - Injected result caches keyed by content hash
//! - TOML manifests and CSV series loading
//! - JSON/CSV artifact export

pub mod batch;
pub mod cache;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use batch::{run_batch, run_batch_cached, BatchResult};
pub use cache::{JsonFileCache, MemoryCache, ResultCache};
pub use config::{BacktestConfig, GameSpec, ManifestError};
pub use data_loader::{load_game, load_games, LoadError};
pub use metrics::{TradeMetrics, TradeTotals};
pub use runner::{
    run_game, GameDiagnostics, GameInput, GameResult, GameStatus, RunError, SCHEMA_VERSION,
};
