// =============================================================================
// Autocorrelation and AR(1) half-life
// =============================================================================

use tracing::trace;

use super::descriptive::{finite_only, linear_fit, mean, population_variance};
use crate::types::BarHorizon;

/// Autocorrelation function for lags `0..=max_lag`.
///
/// Uses the standard biased estimator (denominator `n * var`). Empty for
/// fewer than two points; a flat series has zero autocorrelation beyond lag 0.
pub fn acf(data: &[f64], max_lag: usize) -> Vec<f64> {
    let n = data.len();
    if n < 2 {
        return vec![];
    }

    let max_lag = max_lag.min(n - 1);
    let m = mean(data);
    let var = population_variance(data);

    (0..=max_lag)
        .map(|lag| {
            if lag == 0 {
                return 1.0;
            }
            if var < f64::EPSILON {
                return 0.0;
            }
            let sum: f64 = data[lag..]
                .iter()
                .zip(data[..n - lag].iter())
                .map(|(a, b)| (a - m) * (b - m))
                .sum();
            (sum / (n as f64 * var)).clamp(-1.0, 1.0)
        })
        .collect()
}

/// First-lag autocorrelation in `[-1, 1]`; `0.0` when undefined.
pub fn acf1(series: &[f64]) -> f64 {
    let data = finite_only(series);
    if data.len() < 3 {
        return 0.0;
    }
    acf(&data, 1).get(1).copied().unwrap_or(0.0)
}

/// Bars needed for an AR(1) process to close half the gap to its mean.
///
/// Fits `x_t = c + phi * x_{t-1}`. A coefficient at or above one (or an
/// undefined fit) means no mean reversion and yields `Infinite`; a
/// non-positive coefficient means the gap closes within a single bar.
pub fn half_life_ar1(series: &[f64]) -> BarHorizon {
    let data = finite_only(series);
    if data.len() < 3 {
        trace!(len = data.len(), "half-life: insufficient data");
        return BarHorizon::Infinite;
    }

    let lagged = &data[..data.len() - 1];
    let current = &data[1..];

    let phi = match linear_fit(lagged, current) {
        Some(fit) if fit.slope.is_finite() => fit.slope,
        _ => return BarHorizon::Infinite,
    };

    if phi >= 1.0 {
        return BarHorizon::Infinite;
    }
    if phi <= 0.0 {
        return BarHorizon::Finite(0.0);
    }

    let half_life = 0.5_f64.ln() / phi.ln();
    trace!(
        phi = format!("{:.4}", phi),
        half_life = format!("{:.2}", half_life),
        "AR(1) half-life computed"
    );
    BarHorizon::Finite(half_life)
}
