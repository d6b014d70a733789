use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV bar. Bars are assumed to share one uniform cadence and to be
/// ordered oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(default)]
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    /// Bar with identical OHLC values, handy when only closes are known.
    pub fn flat(open_time: i64, price: f64) -> Self {
        Self {
            open_time,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Series helpers
// ---------------------------------------------------------------------------

/// Close prices in bar order.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Log returns aligned to bars: element `i` is `ln(p[i] / p[i-1])`, element 0
/// is `NaN` because no prior bar exists. A non-positive price also yields
/// `NaN` for the returns that touch it.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(prices.len());
    for i in 0..prices.len() {
        if i == 0 {
            out.push(f64::NAN);
            continue;
        }
        let (prev, cur) = (prices[i - 1], prices[i]);
        if prev > 0.0 && cur > 0.0 {
            out.push((cur / prev).ln());
        } else {
            out.push(f64::NAN);
        }
    }
    out
}

/// Natural log of every price; non-positive prices map to `NaN`.
pub fn log_prices(prices: &[f64]) -> Vec<f64> {
    prices
        .iter()
        .map(|&p| if p > 0.0 { p.ln() } else { f64::NAN })
        .collect()
}

/// Load a JSON array of candles from disk.
pub fn load_candles(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read candles from {}", path.display()))?;

    let candles: Vec<Candle> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse candles from {}", path.display()))?;

    debug!(path = %path.display(), bars = candles.len(), "candles loaded");
    Ok(candles)
}
