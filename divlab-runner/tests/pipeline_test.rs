//! End-to-end: manifest on disk → CSV series → batch → artifacts.

use std::path::Path;

use divlab_runner::export::{load_artifacts, save_artifacts};
use divlab_runner::{
    load_games, run_batch, run_batch_cached, BacktestConfig, GameStatus, JsonFileCache,
};

const MANIFEST: &str = r#"
[simulation]
entry_threshold = 0.05
exit_threshold = 0.01
min_hold_secs = 30
capital = 20.0
fee_rate = 0.07

[[games]]
id = "scenario"
game_start = "2024-03-01T19:00:00Z"
series_a = "scenario/a.csv"
series_b = "scenario/b.csv"

[[games]]
id = "crossed"
game_start = "2024-03-02T19:00:00Z"
series_a = "crossed/a.csv"
series_b = "crossed/b.csv"

[[games]]
id = "lagged"
game_start = "2024-03-03T19:00:00Z"
series_a = "lagged/a.csv"
series_b = "lagged/b.csv"
"#;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Lays out a manifest with three games:
/// - `scenario`: one long round trip
/// - `crossed`: a bid above the ask, unsimulatable
/// - `lagged`: series A recorded on a clock 7 minutes late, estimated quotes,
///   one short that is still open at the end
fn fixture(dir: &Path) -> std::path::PathBuf {
    write(dir, "manifest.toml", MANIFEST);

    write(
        dir,
        "scenario/a.csv",
        "timestamp,probability\n\
         2024-03-01T19:00:00Z,0.50\n\
         2024-03-01T19:00:30Z,0.50\n\
         2024-03-01T19:01:00Z,0.58\n\
         2024-03-01T19:01:30Z,0.58\n\
         2024-03-01T19:02:00Z,0.50\n",
    );
    write(
        dir,
        "scenario/b.csv",
        "timestamp,bid,ask,mid\n\
         2024-03-01T19:00:00Z,0.49,0.51,\n\
         2024-03-01T19:00:30Z,0.48,0.50,\n\
         2024-03-01T19:01:00Z,0.48,0.50,\n\
         2024-03-01T19:01:30Z,0.49,0.51,\n\
         2024-03-01T19:02:00Z,0.49,0.51,\n",
    );

    write(
        dir,
        "crossed/a.csv",
        "timestamp,probability\n\
         2024-03-02T19:00:00Z,0.50\n\
         2024-03-02T19:00:30Z,0.60\n",
    );
    write(
        dir,
        "crossed/b.csv",
        "timestamp,bid,ask,mid\n\
         2024-03-02T19:00:00Z,0.52,0.48,\n",
    );

    // A starts at 19:07 but the game started at 19:00.
    write(
        dir,
        "lagged/a.csv",
        "timestamp,probability\n\
         2024-03-03T19:07:00Z,0.50\n\
         2024-03-03T19:07:30Z,0.44\n\
         2024-03-03T19:08:00Z,0.40\n\
         2024-03-03T19:08:30Z,0.40\n",
    );
    write(
        dir,
        "lagged/b.csv",
        "timestamp,bid,ask,mid\n\
         2024-03-03T19:00:00Z,,,0.50\n\
         2024-03-03T19:00:30Z,,,0.50\n\
         2024-03-03T19:01:00Z,,,0.50\n\
         2024-03-03T19:01:30Z,,,0.50\n",
    );

    dir.join("manifest.toml")
}

#[test]
fn manifest_to_artifacts() {
    let temp = tempfile::tempdir().unwrap();
    let manifest = fixture(temp.path());

    let config = BacktestConfig::from_file(&manifest).unwrap();
    config.validate().unwrap();
    let games = load_games(&config).unwrap();
    assert_eq!(games.len(), 3);

    let batch = run_batch(&games, &config.simulation).unwrap();
    assert_eq!(batch.ok_games, 2);
    assert_eq!(batch.unsimulatable_games, 1);

    let scenario = &batch.games[0];
    assert_eq!(scenario.status, GameStatus::Ok);
    assert_eq!(scenario.ledger.len(), 1);
    assert!(!scenario.ledger.trades()[0].forced_close);

    assert!(matches!(batch.games[1].status, GameStatus::Unsimulatable { .. }));

    let lagged = &batch.games[2];
    assert_eq!(lagged.status, GameStatus::Ok);
    assert_eq!(lagged.diagnostics.aligned_rows, 4);
    assert_eq!(lagged.diagnostics.estimated_rows, 4);
    assert_eq!(lagged.ledger.len(), 1);
    let short = &lagged.ledger.trades()[0];
    assert!(short.forced_close);
    assert!(short.estimated_quote);

    // Aggregate covers only the ok games.
    assert_eq!(batch.aggregate.totals.trade_count, 2);
    assert_eq!(batch.aggregate.totals.forced_closes, 1);

    let out = temp.path().join("results");
    let dir = save_artifacts(&batch, &out).unwrap();
    let trades_csv = std::fs::read_to_string(dir.join("trades.csv")).unwrap();
    assert_eq!(trades_csv.lines().count(), 3);
    let loaded = load_artifacts(&dir).unwrap();
    assert_eq!(loaded, batch);
}

#[test]
fn file_cache_serves_identical_results() {
    let temp = tempfile::tempdir().unwrap();
    let manifest = fixture(temp.path());
    let config = BacktestConfig::from_file(&manifest).unwrap();
    let games = load_games(&config).unwrap();

    let cache = JsonFileCache::new(temp.path().join("cache")).unwrap();
    let first = run_batch_cached(&games, &config.simulation, &cache).unwrap();
    assert_eq!(first.cache_hits, 0);
    assert_eq!(cache.len().unwrap(), 3);

    let second = run_batch_cached(&games, &config.simulation, &cache).unwrap();
    assert_eq!(second.cache_hits, 3);
    assert_eq!(second.games, first.games);
    assert_eq!(second.aggregate, first.aggregate);
}

#[test]
fn missing_series_file_fails_loading() {
    let temp = tempfile::tempdir().unwrap();
    let manifest = fixture(temp.path());
    std::fs::remove_file(temp.path().join("lagged/b.csv")).unwrap();
    let config = BacktestConfig::from_file(&manifest).unwrap();
    assert!(load_games(&config).is_err());
}
