// =============================================================================
// Causal Labelers
// =============================================================================
//
// Heuristic models that turn a price series into one regime per bar using
// only the bars up to and including the one being labelled.
//
//   acf_model      lag-1 autocorrelation of log returns
//                    > +0.05 trending, < -0.05 mean_reverting, else random
//   vr_like_model  Var(k-bar return) / (k * Var(1-bar return)),
//                  k = clamp(window / 5, 2, 10)
//                    > 1.02 trending, < 0.98 mean_reverting, else random
//   drift_model    |mean| > 0.2 * stdev of log returns  => trending
//                    else random (never mean_reverting)
//
// Output always has the same length as the input; bars without a complete
// window are labelled `random`.

pub mod rolling;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::market_data::log_returns;
use crate::stats::{mean, sample_std, sample_variance};
use crate::types::{LabelSequence, Regime};

use rolling::{lag1_correlation, positive_variance, trailing, trailing_sums};

/// Autocorrelation band outside of which the acf model commits.
const ACF_THRESHOLD: f64 = 0.05;

/// Upper / lower variance-ratio bands for the vr-like model.
const VR_TREND_THRESHOLD: f64 = 1.02;
const VR_REVERT_THRESHOLD: f64 = 0.98;

/// Drift must exceed this multiple of the return stdev.
const DRIFT_RATIO: f64 = 0.2;

// =============================================================================
// LabelerKind
// =============================================================================

/// The labelers in the ensemble. Adding a variant forces every `match` below
/// to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LabelerKind {
    #[serde(rename = "acf_model")]
    Acf,
    #[serde(rename = "vr_like_model")]
    VarianceRatio,
    #[serde(rename = "drift_model")]
    Drift,
}

impl LabelerKind {
    pub const ALL: [LabelerKind; 3] = [
        LabelerKind::Acf,
        LabelerKind::VarianceRatio,
        LabelerKind::Drift,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Acf => "acf_model",
            Self::VarianceRatio => "vr_like_model",
            Self::Drift => "drift_model",
        }
    }

    /// Label every bar of `closes` using a trailing window of `window`
    /// returns.
    pub fn label(self, closes: &[f64], window: usize) -> LabelSequence {
        let returns = log_returns(closes);
        let labels = match self {
            Self::Acf => acf_labels(&returns, window),
            Self::VarianceRatio => vr_like_labels(&returns, window),
            Self::Drift => drift_labels(&returns, window),
        };
        debug_assert_eq!(labels.len(), closes.len());
        labels.into()
    }
}

impl fmt::Display for LabelerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Per-labeler windows
// =============================================================================

fn default_window() -> usize {
    50
}

/// Rolling window size for each labeler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelerWindows {
    #[serde(default = "default_window")]
    pub acf: usize,
    #[serde(default = "default_window")]
    pub vr_like: usize,
    #[serde(default = "default_window")]
    pub drift: usize,
}

impl LabelerWindows {
    pub fn uniform(window: usize) -> Self {
        Self {
            acf: window,
            vr_like: window,
            drift: window,
        }
    }

    pub fn window_for(&self, kind: LabelerKind) -> usize {
        match kind {
            LabelerKind::Acf => self.acf,
            LabelerKind::VarianceRatio => self.vr_like,
            LabelerKind::Drift => self.drift,
        }
    }
}

impl Default for LabelerWindows {
    fn default() -> Self {
        Self::uniform(default_window())
    }
}

/// Run every labeler over `closes`.
pub fn label_all(closes: &[f64], windows: &LabelerWindows) -> BTreeMap<LabelerKind, LabelSequence> {
    LabelerKind::ALL
        .iter()
        .map(|&kind| {
            let window = windows.window_for(kind);
            let labels = kind.label(closes, window);
            debug!(
                labeler = %kind,
                window,
                bars = labels.len(),
                last = ?labels.last(),
                "labeler finished"
            );
            (kind, labels)
        })
        .collect()
}

// =============================================================================
// Models
// =============================================================================

fn acf_labels(returns: &[f64], window: usize) -> Vec<Regime> {
    (0..returns.len())
        .map(|t| {
            match trailing(returns, t, window).and_then(lag1_correlation) {
                Some(rho) if rho > ACF_THRESHOLD => Regime::Trending,
                Some(rho) if rho < -ACF_THRESHOLD => Regime::MeanReverting,
                _ => Regime::Random,
            }
        })
        .collect()
}

/// Aggregation horizon of the vr-like model for a given window.
pub fn vr_like_horizon(window: usize) -> usize {
    (window / 5).clamp(2, 10)
}

fn vr_like_labels(returns: &[f64], window: usize) -> Vec<Regime> {
    let k = vr_like_horizon(window);
    let sums = trailing_sums(returns, k);

    (0..returns.len())
        .map(|t| {
            let var_1 = trailing(returns, t, window).and_then(positive_variance);
            // A flat k-bar series is a legitimate zero variance here.
            let var_k = trailing(&sums, t, window).and_then(sample_variance);
            match (var_1, var_k) {
                (Some(v1), Some(vk)) => {
                    let ratio = vk / (k as f64 * v1);
                    if ratio > VR_TREND_THRESHOLD {
                        Regime::Trending
                    } else if ratio < VR_REVERT_THRESHOLD {
                        Regime::MeanReverting
                    } else {
                        Regime::Random
                    }
                }
                _ => Regime::Random,
            }
        })
        .collect()
}

fn drift_labels(returns: &[f64], window: usize) -> Vec<Regime> {
    (0..returns.len())
        .map(|t| {
            let Some(w) = trailing(returns, t, window) else {
                return Regime::Random;
            };
            let Some(std) = sample_std(w) else {
                return Regime::Random;
            };
            let m = mean(w);
            if std > 0.0 && m.abs() > DRIFT_RATIO * std {
                Regime::Trending
            } else {
                Regime::Random
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::test_support::gaussian_noise;

    /// Prices from log returns that follow an AR(1) with coefficient `phi`
    /// around a mean of `drift`.
    fn prices_from_ar_returns(len: usize, phi: f64, drift: f64, seed: u64) -> Vec<f64> {
        let noise = gaussian_noise(len, seed);
        let mut price = 100.0_f64;
        let mut r = 0.0_f64;
        let mut out = Vec::with_capacity(len);
        for e in noise {
            r = phi * r + 0.01 * e;
            price *= (drift + r).exp();
            out.push(price);
        }
        out
    }

    fn zigzag(len: usize) -> Vec<f64> {
        (0..len).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect()
    }

    #[test]
    fn outputs_match_input_length() {
        let closes = prices_from_ar_returns(137, 0.0, 0.0, 1);
        for kind in LabelerKind::ALL {
            assert_eq!(kind.label(&closes, 20).len(), closes.len());
            assert_eq!(kind.label(&[], 20).len(), 0);
            assert_eq!(kind.label(&closes[..5], 20).len(), 5);
        }
    }

    #[test]
    fn warmup_bars_are_random() {
        let closes = zigzag(60);
        for kind in LabelerKind::ALL {
            let labels = kind.label(&closes, 20);
            for t in 0..20 {
                assert_eq!(labels.get(t), Some(Regime::Random), "{kind} bar {t}");
            }
        }
    }

    #[test]
    fn zigzag_is_mean_reverting() {
        let closes = zigzag(120);
        assert_eq!(LabelerKind::Acf.label(&closes, 30).last(), Some(Regime::MeanReverting));
        assert_eq!(
            LabelerKind::VarianceRatio.label(&closes, 30).last(),
            Some(Regime::MeanReverting)
        );
    }

    #[test]
    fn persistent_returns_are_trending() {
        let closes = prices_from_ar_returns(400, 0.6, 0.0, 5);
        assert_eq!(LabelerKind::Acf.label(&closes, 100).last(), Some(Regime::Trending));
        assert_eq!(
            LabelerKind::VarianceRatio.label(&closes, 100).last(),
            Some(Regime::Trending)
        );
    }

    #[test]
    fn steady_drift_is_trending() {
        let closes = prices_from_ar_returns(200, 0.0, 0.01, 9);
        assert_eq!(LabelerKind::Drift.label(&closes, 50).last(), Some(Regime::Trending));
    }

    #[test]
    fn drift_model_never_mean_reverts() {
        let closes = zigzag(200);
        assert!(LabelerKind::Drift
            .label(&closes, 20)
            .iter()
            .all(|r| r != Regime::MeanReverting));
    }

    #[test]
    fn labelers_are_causal() {
        let closes = prices_from_ar_returns(300, 0.3, 0.001, 12);
        for kind in LabelerKind::ALL {
            let full = kind.label(&closes, 40);
            for n in [0, 1, 39, 41, 150, 299] {
                assert_eq!(kind.label(&closes[..n], 40), full.prefix(n), "{kind} n={n}");
            }
        }
    }

    #[test]
    fn vr_horizon_is_clamped() {
        assert_eq!(vr_like_horizon(5), 2);
        assert_eq!(vr_like_horizon(25), 5);
        assert_eq!(vr_like_horizon(500), 10);
    }

    #[test]
    fn label_all_covers_every_model() {
        let closes = zigzag(80);
        let out = label_all(&closes, &LabelerWindows::uniform(20));
        assert_eq!(out.len(), LabelerKind::ALL.len());
        assert!(out.values().all(|s| s.len() == 80));
    }

    #[test]
    fn kind_serialises_with_model_name() {
        assert_eq!(serde_json::to_string(&LabelerKind::Drift).unwrap(), "\"drift_model\"");
    }
}
