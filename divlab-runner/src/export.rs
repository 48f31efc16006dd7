//! Export: JSON and CSV artifacts for game and batch results.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: trade tape across games, and one summary row per game
//!
//! Persisted JSON carries a `schema_version` field. Newer versions than this
//! build understands are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

use divlab_core::domain::TradeLedger;

use crate::batch::BatchResult;
use crate::runner::{GameResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

fn to_json<T: Serialize>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string_pretty(value).with_context(|| format!("failed to serialize {what}"))
}

fn from_json<T: DeserializeOwned>(json: &str, what: &str) -> Result<T> {
    serde_json::from_str(json).with_context(|| format!("failed to deserialize {what}"))
}

fn check_schema(version: u32) -> Result<()> {
    if version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            version,
            SCHEMA_VERSION
        );
    }
    Ok(())
}

pub fn export_game_json(result: &GameResult) -> Result<String> {
    to_json(result, "GameResult")
}

pub fn import_game_json(json: &str) -> Result<GameResult> {
    let result: GameResult = from_json(json, "GameResult")?;
    check_schema(result.schema_version)?;
    Ok(result)
}

pub fn export_batch_json(result: &BatchResult) -> Result<String> {
    to_json(result, "BatchResult")
}

pub fn import_batch_json(json: &str) -> Result<BatchResult> {
    let result: BatchResult = from_json(json, "BatchResult")?;
    check_schema(result.schema_version)?;
    for game in &result.games {
        check_schema(game.schema_version)?;
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

/// Export trade ledgers as one CSV tape.
///
/// Columns: game_id, direction, entry_time, entry_price, entry_divergence,
/// exit_time, exit_price, exit_divergence, contracts, gross_profit, fees,
/// slippage, net_profit, hold_secs, forced_close, estimated_quote
pub fn export_trades_csv<'a, I>(ledgers: I) -> Result<String>
where
    I: IntoIterator<Item = &'a TradeLedger>,
{
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "game_id",
        "direction",
        "entry_time",
        "entry_price",
        "entry_divergence",
        "exit_time",
        "exit_price",
        "exit_divergence",
        "contracts",
        "gross_profit",
        "fees",
        "slippage",
        "net_profit",
        "hold_secs",
        "forced_close",
        "estimated_quote",
    ])?;

    for ledger in ledgers {
        for t in ledger {
            wtr.write_record([
                ledger.game_id.as_str(),
                &t.direction.to_string(),
                &t.entry_time.to_rfc3339(),
                &format!("{:.6}", t.entry_price),
                &format!("{:.6}", t.entry_divergence),
                &t.exit_time.to_rfc3339(),
                &format!("{:.6}", t.exit_price),
                &format!("{:.6}", t.exit_divergence),
                &format!("{:.6}", t.contracts),
                &format!("{:.6}", t.gross_profit),
                &format!("{:.6}", t.fees),
                &format!("{:.6}", t.slippage),
                &format!("{:.6}", t.net_profit),
                &format!("{:.3}", t.hold_secs()),
                &t.forced_close.to_string(),
                &t.estimated_quote.to_string(),
            ])?;
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// One row per game: status, headline metrics, and diagnostics.
pub fn export_games_csv(games: &[GameResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "game_id",
        "status",
        "detail",
        "trades",
        "net_profit",
        "win_rate",
        "expectancy",
        "profit_factor",
        "max_drawdown",
        "sharpe",
        "aligned_rows",
        "dropped_by_alignment",
        "excluded_by_window",
        "estimated_rows",
        "forced_closes",
        "no_market_data",
    ])?;

    for g in games {
        let m = &g.metrics;
        let d = &g.diagnostics;
        wtr.write_record([
            g.game_id.as_str(),
            g.status.label(),
            g.status.detail().unwrap_or(""),
            &m.totals.trade_count.to_string(),
            &format!("{:.6}", m.totals.net_profit),
            &opt(m.win_rate),
            &opt(m.expectancy),
            &opt(m.profit_factor),
            &format!("{:.6}", m.max_drawdown),
            &opt(m.sharpe),
            &d.aligned_rows.to_string(),
            &d.dropped_by_alignment.to_string(),
            &d.excluded_by_window.to_string(),
            &d.estimated_rows.to_string(),
            &d.forced_closes.to_string(),
            &d.no_market_data.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a batch.
///
/// Creates `batch_{config_hash prefix}_{timestamp}/` under `output_dir` with:
/// - `summary.json`: the full `BatchResult`
/// - `games.csv`: one row per game
/// - `trades.csv`: every trade of every `Ok` game
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BatchResult, output_dir: &Path) -> Result<PathBuf> {
    let hash = &result.config_hash.0;
    let dirname = format!(
        "batch_{}_{}",
        &hash[..hash.len().min(12)],
        Utc::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_batch_json(result)?;
    std::fs::write(run_dir.join("summary.json"), json)?;

    let games_csv = export_games_csv(&result.games)?;
    std::fs::write(run_dir.join("games.csv"), games_csv)?;

    let trades_csv = export_trades_csv(result.ok_results().map(|g| &g.ledger))?;
    std::fs::write(run_dir.join("trades.csv"), trades_csv)?;

    Ok(run_dir)
}

/// Load a `BatchResult` from an artifact directory's summary.json.
pub fn load_artifacts(dir: &Path) -> Result<BatchResult> {
    let path = dir.join("summary.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_batch_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::run_batch;
    use crate::runner::GameInput;
    use chrono::{DateTime, Duration, TimeZone};
    use divlab_core::domain::{QuotePoint, RawPoint};
    use divlab_core::SimConfig;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 19, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn sample_batch() -> BatchResult {
        let a = [0.50, 0.50, 0.58, 0.58, 0.50];
        let mid = [0.50, 0.49, 0.49, 0.50, 0.50];
        let game = GameInput::new(
            "scenario",
            t(0),
            a.iter()
                .enumerate()
                .map(|(i, &v)| RawPoint::new(t(30 * i as i64), v))
                .collect(),
            mid.iter()
                .enumerate()
                .map(|(i, &m)| QuotePoint::two_sided(t(30 * i as i64), m - 0.01, m + 0.01))
                .collect(),
        );
        let empty = GameInput::new("empty", t(0), vec![], vec![]);
        run_batch(&[game, empty], &SimConfig::default()).unwrap()
    }

    #[test]
    fn batch_json_roundtrip() {
        let batch = sample_batch();
        let json = export_batch_json(&batch).unwrap();
        let restored = import_batch_json(&json).unwrap();
        assert_eq!(restored, batch);
        assert_eq!(restored.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn future_schema_is_rejected() {
        let mut game = sample_batch().games.remove(0);
        game.schema_version = SCHEMA_VERSION + 1;
        let json = export_game_json(&game).unwrap();
        let err = import_game_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn missing_schema_version_defaults() {
        let game = sample_batch().games.remove(0);
        let mut value = serde_json::to_value(&game).unwrap();
        value.as_object_mut().unwrap().remove("schema_version");
        let restored = import_game_json(&value.to_string()).unwrap();
        assert_eq!(restored.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn trades_csv_has_header_and_rows() {
        let batch = sample_batch();
        let csv = export_trades_csv(batch.games.iter().map(|g| &g.ledger)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("game_id,direction,entry_time"));
        assert!(lines[1].starts_with("scenario,long,"));
    }

    #[test]
    fn games_csv_reports_status() {
        let batch = sample_batch();
        let csv = export_games_csv(&batch.games).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("scenario,ok,,1,"));
        assert!(lines[2].starts_with("empty,unsimulatable,series A is empty,0,"));
    }

    #[test]
    fn save_and_load_artifacts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let batch = sample_batch();
        let dir = save_artifacts(&batch, temp_dir.path()).unwrap();

        assert!(dir.join("summary.json").exists());
        assert!(dir.join("games.csv").exists());
        assert!(dir.join("trades.csv").exists());

        let loaded = load_artifacts(&dir).unwrap();
        assert_eq!(loaded.games.len(), 2);
        assert_eq!(loaded.config_hash, batch.config_hash);
    }
}
