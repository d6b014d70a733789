// =============================================================================
// Rolling estimates: Hurst, skewness, kurtosis
// =============================================================================
//
// Windows advance by `step` bars. Each row is indexed by the position of the
// last bar in its window, so a row never depends on bars after its index.
// A zero window or step, or a window longer than the series, yields an empty
// table.

use serde::{Deserialize, Serialize};

use super::descriptive::{finite_only, mean, population_variance};
use super::hurst::{hurst_rs, HurstEstimate};

/// One windowed Hurst estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingHurstRow {
    /// Index of the last bar in the window.
    pub end: usize,
    pub estimate: HurstEstimate,
}

/// One windowed skewness / excess-kurtosis pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkewKurtRow {
    /// Index of the last bar in the window.
    pub end: usize,
    pub skew: f64,
    pub kurt: f64,
}

/// Inclusive end indices of every window.
fn window_ends(len: usize, window: usize, step: usize) -> Vec<usize> {
    if window == 0 || step == 0 || window > len {
        return Vec::new();
    }
    (window - 1..len).step_by(step).collect()
}

pub fn rolling_hurst(series: &[f64], window: usize, step: usize) -> Vec<RollingHurstRow> {
    window_ends(series.len(), window, step)
        .into_iter()
        .map(|end| RollingHurstRow {
            end,
            estimate: hurst_rs(&series[end + 1 - window..=end]),
        })
        .collect()
}

pub fn rolling_skew_kurt(series: &[f64], window: usize, step: usize) -> Vec<SkewKurtRow> {
    window_ends(series.len(), window, step)
        .into_iter()
        .map(|end| {
            let (skew, kurt) = skew_kurt(&series[end + 1 - window..=end]);
            SkewKurtRow { end, skew, kurt }
        })
        .collect()
}

/// Population skewness and excess kurtosis; `(0, 0)` for flat or tiny input.
pub fn skew_kurt(data: &[f64]) -> (f64, f64) {
    let data = finite_only(data);
    if data.len() < 3 {
        return (0.0, 0.0);
    }
    let m = mean(&data);
    let m2 = population_variance(&data);
    if m2 < f64::EPSILON * f64::EPSILON {
        return (0.0, 0.0);
    }
    let n = data.len() as f64;
    let m3 = data.iter().map(|x| (x - m).powi(3)).sum::<f64>() / n;
    let m4 = data.iter().map(|x| (x - m).powi(4)).sum::<f64>() / n;
    (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
}

/// Dispersion of rolling skew and kurtosis: the sum of their population
/// standard deviations. Higher means less stable higher moments.
pub fn skew_kurt_stability_index(table: &[SkewKurtRow]) -> f64 {
    if table.len() < 2 {
        return 0.0;
    }
    let skews: Vec<f64> = table.iter().map(|r| r.skew).collect();
    let kurts: Vec<f64> = table.iter().map(|r| r.kurt).collect();
    let index = population_variance(&skews).sqrt() + population_variance(&kurts).sqrt();
    if index.is_finite() {
        index
    } else {
        0.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::test_support::gaussian_noise;

    #[test]
    fn window_positions_advance_by_step() {
        let series = gaussian_noise(100, 2);
        let rows = rolling_skew_kurt(&series, 30, 20);
        let ends: Vec<usize> = rows.iter().map(|r| r.end).collect();
        assert_eq!(ends, vec![29, 49, 69, 89]);
    }

    #[test]
    fn oversized_or_zero_window_is_empty() {
        let series = gaussian_noise(10, 2);
        assert!(rolling_hurst(&series, 11, 1).is_empty());
        assert!(rolling_hurst(&series, 0, 1).is_empty());
        assert!(rolling_skew_kurt(&series, 5, 0).is_empty());
        assert!(rolling_skew_kurt(&[], 5, 1).is_empty());
    }

    #[test]
    fn rolling_hurst_stays_in_unit_interval() {
        let rows = rolling_hurst(&gaussian_noise(300, 4), 64, 16);
        assert!(!rows.is_empty());
        for row in rows {
            assert!((0.0..=1.0).contains(&row.estimate.h));
        }
    }

    #[test]
    fn skew_of_symmetric_data_is_zero() {
        let (skew, kurt) = skew_kurt(&[-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert!(skew.abs() < 1e-12);
        // Uniform-like spread has negative excess kurtosis.
        assert!(kurt < 0.0);
    }

    #[test]
    fn skewed_data_is_positive() {
        let (skew, _) = skew_kurt(&[0.0, 0.0, 0.0, 0.0, 10.0]);
        assert!(skew > 1.0);
    }

    #[test]
    fn stability_index_non_negative() {
        let rows = rolling_skew_kurt(&gaussian_noise(500, 8), 50, 10);
        assert!(skew_kurt_stability_index(&rows) >= 0.0);
        assert_eq!(skew_kurt_stability_index(&[]), 0.0);
    }

    #[test]
    fn constant_moments_are_perfectly_stable() {
        let row = SkewKurtRow {
            end: 0,
            skew: 0.3,
            kurt: 1.2,
        };
        assert!(skew_kurt_stability_index(&[row, row, row]) < 1e-12);
    }
}
