//! divlab CLI: validate and run divergence backtests.
//!
//! Commands:
//! - `run`: load a game manifest, run every game, print a summary, save artifacts
//! - `check`: parse and validate a manifest without running anything

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use divlab_core::SimConfig;
use divlab_runner::export::save_artifacts;
use divlab_runner::{
    load_games, run_batch, run_batch_cached, BacktestConfig, BatchResult, JsonFileCache,
};

#[derive(Parser)]
#[command(
    name = "divlab",
    about = "divlab CLI: probability-divergence trading backtests"
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every game in a TOML manifest.
    Run {
        /// Path to the manifest.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Reuse results from this directory and store new ones there.
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Parse and validate a manifest, then print its configuration hash.
    Check {
        /// Path to the manifest.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            cache_dir,
        } => run_cmd(&config, &output_dir, cache_dir.as_deref()),
        Commands::Check { config } => check_cmd(&config),
    }
}

fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn load_manifest(path: &Path) -> Result<BacktestConfig> {
    let manifest = BacktestConfig::from_file(path)
        .with_context(|| format!("failed to load manifest {}", path.display()))?;
    manifest.validate()?;
    Ok(manifest)
}

fn run_cmd(config_path: &Path, output_dir: &Path, cache_dir: Option<&Path>) -> Result<()> {
    let manifest = load_manifest(config_path)?;
    let games = load_games(&manifest)?;
    info!(games = games.len(), "loaded manifest");

    let result = match cache_dir {
        Some(dir) => {
            let cache = JsonFileCache::new(dir)?;
            run_batch_cached(&games, &manifest.simulation, &cache)?
        }
        None => run_batch(&games, &manifest.simulation)?,
    };

    print_summary(&result);

    let run_dir = save_artifacts(&result, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn check_cmd(config_path: &Path) -> Result<()> {
    let manifest = load_manifest(config_path)?;
    println!("Manifest OK: {}", config_path.display());
    println!("Games:          {}", manifest.games.len());
    print_config(&manifest.simulation)?;
    Ok(())
}

fn print_config(config: &SimConfig) -> Result<()> {
    println!("Config hash:    {}", config.config_hash());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.precision$}"))
}

fn print_summary(result: &BatchResult) {
    print!("{}", format_summary(result));
}

fn format_summary(result: &BatchResult) -> String {
    let m = &result.aggregate;
    let mut lines = vec![
        String::new(),
        "=== Batch Result ===".to_string(),
        format!("Config hash:    {}", result.config_hash),
        format!("Games:          {}", result.games.len()),
        format!("  ok:             {}", result.ok_games),
        format!("  unsimulatable:  {}", result.unsimulatable_games),
        format!("  error:          {}", result.error_games),
    ];
    if result.cache_hits > 0 {
        lines.push(format!("Cache hits:     {}", result.cache_hits));
    }
    lines.extend([
        String::new(),
        "--- Performance (ok games) ---".to_string(),
        format!("Trades:         {}", m.totals.trade_count),
        format!("Forced closes:  {}", m.totals.forced_closes),
        format!("Net profit:     {:.2}", m.totals.net_profit),
        format!("Fees:           {:.2}", m.totals.total_fees),
        format!("Win rate:       {}", fmt_opt(m.win_rate.map(|w| w * 100.0), 1)),
        format!("Expectancy:     {}", fmt_opt(m.expectancy, 4)),
        format!("Profit factor:  {}", fmt_opt(m.profit_factor, 2)),
        format!("Max drawdown:   {:.2}", m.max_drawdown),
        format!("Sharpe (trade): {}", fmt_opt(m.sharpe, 3)),
    ]);

    let excluded: Vec<_> = result.games.iter().filter(|g| !g.status.is_ok()).collect();
    if !excluded.is_empty() {
        lines.push(String::new());
        for game in excluded {
            lines.push(format!(
                "EXCLUDED {} ({}): {}",
                game.game_id,
                game.status.label(),
                game.status.detail().unwrap_or_default()
            ));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
