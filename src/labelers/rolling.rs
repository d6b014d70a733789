// =============================================================================
// Causal rolling primitives
// =============================================================================
//
// Every helper here looks only at values at or before the bar it is asked
// about. A window that reaches before the start of the series, or that holds
// a non-finite value, is undefined (`None`).

use crate::stats::descriptive::{all_finite, mean, sample_variance};

/// The `window` values ending at bar `t` (inclusive).
pub fn trailing(values: &[f64], t: usize, window: usize) -> Option<&[f64]> {
    if window == 0 || t >= values.len() || t + 1 < window {
        return None;
    }
    let slice = &values[t + 1 - window..=t];
    if all_finite(slice) {
        Some(slice)
    } else {
        None
    }
}

/// Sum of the `k` values ending at each bar; `NaN` where undefined.
pub fn trailing_sums(values: &[f64], k: usize) -> Vec<f64> {
    (0..values.len())
        .map(|t| trailing(values, t, k).map_or(f64::NAN, |w| w.iter().sum()))
        .collect()
}

/// Pearson correlation of a window with itself shifted by one bar.
pub fn lag1_correlation(window: &[f64]) -> Option<f64> {
    if window.len() < 3 {
        return None;
    }
    let current = &window[1..];
    let previous = &window[..window.len() - 1];

    let mc = mean(current);
    let mp = mean(previous);
    let mut cov = 0.0_f64;
    let mut vc = 0.0_f64;
    let mut vp = 0.0_f64;
    for (c, p) in current.iter().zip(previous) {
        cov += (c - mc) * (p - mp);
        vc += (c - mc).powi(2);
        vp += (p - mp).powi(2);
    }

    let denom = (vc * vp).sqrt();
    if denom < f64::EPSILON {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0))
}

/// Sample variance of a window, `None` when it is not positive.
pub fn positive_variance(window: &[f64]) -> Option<f64> {
    sample_variance(window).filter(|v| *v > f64::EPSILON * f64::EPSILON)
}
