// =============================================================================
// Regime Engine — full labelling / transition / volatility pipeline
// =============================================================================
//
// Runs every stage of the analysis for one symbol's bar history:
//
//   1. Causal labelers      closes -> one label sequence per model
//   2. Ensemble vote        label sequences -> consensus + agreement
//   3. Markov model         consensus -> transition matrix, durations,
//                           next-bar probabilities
//   4. Flip volatility      consensus + log returns -> volatility shift
//   5. Diagnostics          Hurst (R/S, DFA), variance ratios, ARCH-LM,
//                           acf1, AR(1) half-lives, moment stability
//
// The engine itself holds no per-run state. It only caches the most recent
// summary per symbol so that consumers can read it without recomputing.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::ensemble::vote_with_agreement;
use crate::labelers::{label_all, LabelerKind};
use crate::market_data::{closes, log_prices, log_returns, Candle};
use crate::markov::{StateDistribution, TransitionMatrix};
use crate::stats::{
    acf1, arch_lm_test, half_life_ar1, hurst_dfa, hurst_rs, rolling_skew_kurt,
    skew_kurt_stability_index, variance_ratio_multi, ArchLmResult, HurstEstimate, VarianceRatio,
};
use crate::types::{BarHorizon, LabelSequence, Regime, RegimeAlphabet};
use crate::volatility_shift::{analyze_flip_volatility, VolatilityShift};

// =============================================================================
// Types
// =============================================================================

/// Formal statistics of the whole series, independent of the labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Rescaled-range Hurst exponent of log returns.
    pub hurst_rs: HurstEstimate,
    /// DFA scaling exponent of log returns.
    pub hurst_dfa: f64,
    /// Variance ratios of log prices, one per configured lag.
    pub variance_ratios: Vec<VarianceRatio>,
    /// ARCH-LM test on log returns.
    pub arch_lm: ArchLmResult,
    /// First-lag autocorrelation of log returns.
    pub acf1: f64,
    pub half_life_returns: BarHorizon,
    pub half_life_log_price: BarHorizon,
    /// Dispersion of rolling skew/kurtosis of log returns.
    pub stability_index: f64,
}

/// Everything the engine knows about one symbol after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeSummary {
    pub symbol: String,
    pub bars: usize,
    pub computed_at: DateTime<Utc>,
    /// Consensus at the last bar, `None` for an empty history. A label the
    /// configured alphabet does not contain is reported as `Random`.
    pub latest: Option<Regime>,
    pub labels: BTreeMap<LabelerKind, LabelSequence>,
    pub consensus: LabelSequence,
    pub agreement: Vec<f64>,
    pub transitions: TransitionMatrix,
    /// Expected run length of every alphabet state.
    pub expected_durations: BTreeMap<Regime, BarHorizon>,
    /// Distribution of the next bar's regime given `latest`.
    pub next_bar: Option<StateDistribution>,
    pub volatility_shift: VolatilityShift,
    pub diagnostics: Diagnostics,
}

impl RegimeSummary {
    /// Regime as seen by execution: a trend during a volatility expansion is
    /// reported as `VolatileTrending`; no history reads as `Random`.
    pub fn execution_regime(&self) -> Regime {
        match self.latest {
            Some(Regime::Trending) if self.volatility_shift.expanding => Regime::VolatileTrending,
            Some(r) => r,
            None => Regime::Random,
        }
    }

    /// Agreement behind the latest consensus label.
    pub fn latest_agreement(&self) -> f64 {
        self.agreement.last().copied().unwrap_or(0.0)
    }
}

// =============================================================================
// RegimeEngine
// =============================================================================

/// Thread-safe engine that caches the latest summary per symbol.
pub struct RegimeEngine {
    config: EngineConfig,
    latest: RwLock<HashMap<String, RegimeSummary>>,
}

impl RegimeEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            latest: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyse a candle history (oldest first) for `symbol`.
    pub fn analyze(&self, symbol: &str, candles: &[Candle]) -> RegimeSummary {
        self.analyze_closes(symbol, &closes(candles))
    }

    /// Analyse a close-price history (oldest first) for `symbol` and cache
    /// the result.
    pub fn analyze_closes(&self, symbol: &str, prices: &[f64]) -> RegimeSummary {
        let summary = summarize(&self.config, symbol, prices);
        self.latest
            .write()
            .insert(symbol.to_string(), summary.clone());
        summary
    }

    /// Most recent summary for `symbol` without recomputing.
    pub fn latest(&self, symbol: &str) -> Option<RegimeSummary> {
        self.latest.read().get(symbol).cloned()
    }

    /// Symbols with a cached summary, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = self.latest.read().keys().cloned().collect();
        out.sort();
        out
    }
}

impl Default for RegimeEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

// =============================================================================
// Pipeline
// =============================================================================

fn summarize(config: &EngineConfig, symbol: &str, prices: &[f64]) -> RegimeSummary {
    let labels = label_all(prices, &config.labeler_windows);
    let consensus = vote_with_agreement(labels.values());

    let transitions =
        TransitionMatrix::from_labels(&consensus.labels, &config.alphabet, config.markov_lookback);
    let latest = consensus
        .labels
        .last()
        .map(|r| restrict_to_alphabet(&config.alphabet, r));

    let expected_durations: BTreeMap<Regime, BarHorizon> = config
        .alphabet
        .states()
        .iter()
        .map(|&s| (s, transitions.expected_duration(s)))
        .collect();
    let next_bar = latest.map(|r| transitions.one_step(r));

    let returns = log_returns(prices);
    let volatility_shift = analyze_flip_volatility(
        consensus.labels.as_slice(),
        &returns,
        config.flip_half_window,
        config.volatility_expansion_threshold,
    );

    let diagnostics = diagnose(config, prices, &returns);

    debug!(
        symbol,
        bars = prices.len(),
        latest = ?latest,
        agreement = format!("{:.2}", consensus.latest_agreement()),
        transitions = transitions.observations(),
        vol_ratio = format!("{:.4}", volatility_shift.ratio),
        hurst = format!("{:.4}", diagnostics.hurst_rs.h),
        "regime summary computed"
    );

    RegimeSummary {
        symbol: symbol.to_string(),
        bars: prices.len(),
        computed_at: Utc::now(),
        latest,
        labels,
        consensus: consensus.labels,
        agreement: consensus.agreement,
        transitions,
        expected_durations,
        next_bar,
        volatility_shift,
        diagnostics,
    }
}

fn restrict_to_alphabet(alphabet: &RegimeAlphabet, regime: Regime) -> Regime {
    if alphabet.contains(regime) {
        regime
    } else {
        trace!(regime = %regime, "latest label outside alphabet, reporting random");
        Regime::Random
    }
}

fn diagnose(config: &EngineConfig, prices: &[f64], returns: &[f64]) -> Diagnostics {
    let levels = log_prices(prices);
    let moments = rolling_skew_kurt(returns, config.rolling_window, config.rolling_step);

    Diagnostics {
        hurst_rs: hurst_rs(returns),
        hurst_dfa: hurst_dfa(returns),
        variance_ratios: variance_ratio_multi(&levels, &config.variance_ratio_lags),
        arch_lm: arch_lm_test(returns, config.arch_lm_lags),
        acf1: acf1(returns),
        half_life_returns: half_life_ar1(returns),
        half_life_log_price: half_life_ar1(&levels),
        stability_index: skew_kurt_stability_index(&moments),
    }
}
