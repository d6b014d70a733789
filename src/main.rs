// =============================================================================
// Regime Engine — batch analyzer
// =============================================================================
//
// Usage: regime-engine <candles.json>...
//
// Each file holds a JSON array of candles (oldest first); the file stem is
// used as the symbol. Symbols are analysed in parallel on the blocking pool
// and one JSON summary per symbol is printed to stdout, in argument order.
//
// Environment:
//   REGIME_CONFIG   path of the engine config (default regime_config.json)
//   RUST_LOG        tracing filter (default info)
// =============================================================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use futures_util::future::join_all;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use regime_engine::market_data::load_candles;
use regime_engine::{EngineConfig, RegimeEngine, RegimeSummary};

const DEFAULT_CONFIG_PATH: &str = "regime_config.json";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path =
        std::env::var("REGIME_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let config = EngineConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(path = %config_path, error = %e, "Failed to load config, using defaults");
        EngineConfig::default()
    });

    let files: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if files.is_empty() {
        bail!("usage: regime-engine <candles.json>...");
    }

    info!(
        files = files.len(),
        lookback = config.markov_lookback,
        flip_half_window = config.flip_half_window,
        "Regime engine starting"
    );

    // ── 2. Fan out per symbol ────────────────────────────────────────────
    let engine = Arc::new(RegimeEngine::new(config));

    let tasks = files.into_iter().map(|path| {
        let engine = engine.clone();
        tokio::task::spawn_blocking(move || analyze_file(&engine, &path))
    });

    let mut summaries: Vec<RegimeSummary> = Vec::new();
    let mut failures = 0_usize;
    for joined in join_all(tasks).await {
        match joined.context("analysis task panicked")? {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                failures += 1;
                error!(error = %format!("{:#}", e), "Symbol analysis failed");
            }
        }
    }

    // ── 3. Report ────────────────────────────────────────────────────────
    let out = serde_json::to_string_pretty(&summaries).context("failed to serialise summaries")?;
    println!("{out}");

    info!(
        analysed = summaries.len(),
        failed = failures,
        "Regime engine finished"
    );

    if summaries.is_empty() {
        bail!("no symbol could be analysed");
    }
    Ok(())
}

fn analyze_file(engine: &RegimeEngine, path: &Path) -> Result<RegimeSummary> {
    let symbol = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .with_context(|| format!("no symbol in file name {}", path.display()))?;

    let candles = load_candles(path)?;
    let summary = engine.analyze(&symbol, &candles);

    info!(
        symbol = %summary.symbol,
        bars = summary.bars,
        regime = %summary.execution_regime(),
        agreement = format!("{:.2}", summary.latest_agreement()),
        vol_ratio = format!("{:.4}", summary.volatility_shift.ratio),
        "Symbol analysed"
    );

    Ok(summary)
}
