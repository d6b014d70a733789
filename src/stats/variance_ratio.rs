// =============================================================================
// Variance Ratio Test (Lo–MacKinlay)
// =============================================================================
//
// Compares the variance of overlapping q-period increments with q times the
// variance of one-period increments of a level series x:
//
//   d_t     = x_t - x_{t-1}
//   VR(q)   = Var(d_t + ... + d_{t-q+1}) / (q * Var(d_t))
//
//   VR ~ 1  =>  random walk
//   VR > 1  =>  increments reinforce each other (trend persistence)
//   VR < 1  =>  increments offset each other (mean reversion)
//
// Variances are second moments about zero, i.e. the null hypothesis is a
// driftless random walk, so a steady drift registers as persistence.
// The homoskedastic asymptotic variance
//
//   phi(q) = 2 (2q - 1)(q - 1) / (3 q n)
//
// gives z = (VR - 1) / sqrt(phi(q)) and a two-sided normal p-value.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::trace;

use super::descriptive::finite_only;

/// Outcome of a variance-ratio test at one lag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarianceRatio {
    pub vr: f64,
    /// Two-sided p-value in `[0, 1]`.
    pub p: f64,
    pub q: usize,
    pub z: f64,
}

impl VarianceRatio {
    /// Random-walk result: no evidence either way.
    pub fn neutral(q: usize) -> Self {
        Self {
            vr: 1.0,
            p: 1.0,
            q,
            z: 0.0,
        }
    }
}

/// Variance ratio of the level series `series` at lag `q`.
pub fn variance_ratio(series: &[f64], q: usize) -> VarianceRatio {
    let levels = finite_only(series);
    if q < 2 || levels.len().saturating_sub(2) < q {
        trace!(len = levels.len(), q, "variance ratio: insufficient data");
        return VarianceRatio::neutral(q);
    }

    let diffs: Vec<f64> = levels.windows(2).map(|w| w[1] - w[0]).collect();
    let n = diffs.len();

    let var_1 = diffs.iter().map(|d| d * d).sum::<f64>() / n as f64;
    if var_1 < f64::EPSILON * f64::EPSILON {
        trace!(q, "variance ratio: zero one-period variance");
        return VarianceRatio::neutral(q);
    }

    // Overlapping q-period sums via a running window.
    let mut window_sum: f64 = diffs[..q].iter().sum();
    let mut sum_sq = window_sum * window_sum;
    for t in q..n {
        window_sum += diffs[t] - diffs[t - q];
        sum_sq += window_sum * window_sum;
    }
    let m = n - q + 1;
    let var_q = sum_sq / (m as f64 * q as f64);

    let vr = var_q / var_1;
    if !vr.is_finite() {
        return VarianceRatio::neutral(q);
    }

    let qf = q as f64;
    let phi = 2.0 * (2.0 * qf - 1.0) * (qf - 1.0) / (3.0 * qf * n as f64);
    let z = (vr - 1.0) / phi.sqrt();
    let p = two_sided_p(z);

    trace!(
        q,
        vr = format!("{:.4}", vr),
        z = format!("{:.3}", z),
        p = format!("{:.4}", p),
        "variance ratio computed"
    );

    VarianceRatio { vr, p, q, z }
}

/// Variance ratios for every lag in `lags`, in the given order.
pub fn variance_ratio_multi(series: &[f64], lags: &[usize]) -> Vec<VarianceRatio> {
    lags.iter().map(|&q| variance_ratio(series, q)).collect()
}

fn two_sided_p(z: f64) -> f64 {
    if !z.is_finite() {
        return if z.is_nan() { 1.0 } else { 0.0 };
    }
    match Normal::new(0.0, 1.0) {
        Ok(normal) => (2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}
