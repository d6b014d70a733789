// =============================================================================
// Regime-Change Volatility Analyzer
// =============================================================================
//
// Measures whether regime flips coincide with a change in return dispersion.
//
//   flip at i       label[i] != label[i-1]
//   pre window      returns[i-k .. i)        (k bars before the flip bar)
//   post window     returns[i+1 ..= i+k]     (k bars after the flip bar)
//
// Only flips with a full pre and post window contribute. All pre windows are
// pooled into one set and all post windows into another, and the result is
//
//   ratio = stdev(post) / max(stdev(pre), EPSILON)
//
// using sample standard deviations. No usable flip, or a set with fewer than
// two returns, gives the neutral ratio 1.0.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::stats::descriptive::{all_finite, sample_std};
use crate::types::Regime;

/// Floor for the pre-flip dispersion.
pub const EPSILON: f64 = 1e-12;

/// Pooled pre/post dispersion around regime flips.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityShift {
    pub ratio: f64,
    /// Every flip found in the label sequence.
    pub flips: usize,
    /// Flips with a full window on both sides.
    pub flips_used: usize,
    pub pre_stdev: Option<f64>,
    pub post_stdev: Option<f64>,
    /// `ratio` exceeded the caller's expansion threshold.
    pub expanding: bool,
}

impl VolatilityShift {
    fn neutral(flips: usize, flips_used: usize) -> Self {
        Self {
            ratio: 1.0,
            flips,
            flips_used,
            pre_stdev: None,
            post_stdev: None,
            expanding: false,
        }
    }
}

/// Positions where the label differs from the previous bar.
pub fn flip_indices(labels: &[Regime]) -> Vec<usize> {
    labels
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] != w[1])
        .map(|(i, _)| i + 1)
        .collect()
}

/// Ratio of post-flip to pre-flip return dispersion, `1.0` when undefined.
pub fn flip_volatility_ratio(labels: &[Regime], returns: &[f64], k: usize) -> f64 {
    analyze_flip_volatility(labels, returns, k, f64::INFINITY).ratio
}

/// Full flip-volatility report; `expanding` is set when the ratio exceeds
/// `expansion_threshold`.
pub fn analyze_flip_volatility(
    labels: &[Regime],
    returns: &[f64],
    k: usize,
    expansion_threshold: f64,
) -> VolatilityShift {
    let len = labels.len().min(returns.len());
    let flips = flip_indices(&labels[..len]);

    if k == 0 || len.saturating_sub(1) / 2 < k {
        trace!(len, k, "flip volatility: series too short");
        return VolatilityShift::neutral(flips.len(), 0);
    }

    let mut pre: Vec<f64> = Vec::new();
    let mut post: Vec<f64> = Vec::new();
    let mut used = 0_usize;

    for &i in &flips {
        if i < k || i + k >= len {
            continue;
        }
        let before = &returns[i - k..i];
        let after = &returns[i + 1..=i + k];
        if !all_finite(before) || !all_finite(after) {
            continue;
        }
        pre.extend_from_slice(before);
        post.extend_from_slice(after);
        used += 1;
    }

    let (Some(pre_sd), Some(post_sd)) = (sample_std(&pre), sample_std(&post)) else {
        trace!(
            flips = flips.len(),
            used,
            "flip volatility: no usable flips"
        );
        return VolatilityShift::neutral(flips.len(), used);
    };

    let ratio = post_sd / pre_sd.max(EPSILON);
    let expanding = ratio > expansion_threshold;

    debug!(
        flips = flips.len(),
        used,
        pre_stdev = format!("{:.6}", pre_sd),
        post_stdev = format!("{:.6}", post_sd),
        ratio = format!("{:.4}", ratio),
        expanding,
        "flip volatility computed"
    );

    VolatilityShift {
        ratio,
        flips: flips.len(),
        flips_used: used,
        pre_stdev: Some(pre_sd),
        post_stdev: Some(post_sd),
        expanding,
    }
}
