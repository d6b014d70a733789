// =============================================================================
// Engle's ARCH-LM test for volatility clustering
// =============================================================================
//
// Regress the squared demeaned returns on their own `lags` lags:
//
//   e²_t = a_0 + a_1 e²_{t-1} + ... + a_p e²_{t-p}
//
// LM = (n - p) * R²  ~  chi²(p)  under the null of no ARCH effects.
//
// The test only reports the statistic and p-value; callers decide what a
// small p-value means for them.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::trace;

use super::descriptive::{finite_only, mean};

/// ARCH-LM test outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArchLmResult {
    pub lm_stat: f64,
    pub p: f64,
    pub lags: usize,
}

impl ArchLmResult {
    /// No evidence of clustering.
    pub fn neutral(lags: usize) -> Self {
        Self {
            lm_stat: 0.0,
            p: 1.0,
            lags,
        }
    }
}

/// ARCH-LM test on the return series `series` with `lags` lags.
pub fn arch_lm_test(series: &[f64], lags: usize) -> ArchLmResult {
    let returns = finite_only(series);
    let n = returns.len();
    // Need more observations than regressors for a usable fit.
    if lags == 0 || n.saturating_sub(2) / 2 < lags {
        trace!(len = n, lags, "ARCH-LM: insufficient data");
        return ArchLmResult::neutral(lags);
    }

    let m = mean(&returns);
    let sq: Vec<f64> = returns.iter().map(|r| (r - m).powi(2)).collect();

    let effective_n = n - lags;
    let mut x_data = Vec::with_capacity(effective_n * (lags + 1));
    let mut y_data = Vec::with_capacity(effective_n);
    for t in lags..n {
        y_data.push(sq[t]);
        x_data.push(1.0);
        for i in 1..=lags {
            x_data.push(sq[t - i]);
        }
    }

    let y_mean = mean(&y_data);
    let sst: f64 = y_data.iter().map(|yi| (yi - y_mean).powi(2)).sum();
    if sst < f64::EPSILON * f64::EPSILON {
        trace!(lags, "ARCH-LM: constant squared returns");
        return ArchLmResult::neutral(lags);
    }

    let x = DMatrix::from_row_slice(effective_n, lags + 1, &x_data);
    let y = DVector::from_vec(y_data);

    let xtx = x.transpose() * &x;
    let xty = x.transpose() * &y;
    let beta = match xtx.try_inverse() {
        Some(inv) => inv * xty,
        None => {
            trace!(lags, "ARCH-LM: singular design matrix");
            return ArchLmResult::neutral(lags);
        }
    };

    let residuals = &y - &x * beta;
    let ssr: f64 = residuals.iter().map(|r| r * r).sum();
    let r2 = (1.0 - ssr / sst).clamp(0.0, 1.0);

    let lm_stat = effective_n as f64 * r2;
    if !lm_stat.is_finite() {
        return ArchLmResult::neutral(lags);
    }

    let p = match ChiSquared::new(lags as f64) {
        Ok(chi2) => (1.0 - chi2.cdf(lm_stat)).clamp(0.0, 1.0),
        Err(_) => 1.0,
    };

    trace!(
        lags,
        lm_stat = format!("{:.3}", lm_stat),
        p = format!("{:.4}", p),
        "ARCH-LM computed"
    );

    ArchLmResult { lm_stat, p, lags }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::test_support::gaussian_noise;

    /// Returns whose scale switches between calm and stormy blocks.
    fn clustered_returns(len: usize) -> Vec<f64> {
        gaussian_noise(len, 77)
            .into_iter()
            .enumerate()
            .map(|(i, e)| if (i / 50) % 2 == 0 { 0.1 * e } else { 3.0 * e })
            .collect()
    }

    #[test]
    fn clustering_is_detected() {
        let r = arch_lm_test(&clustered_returns(1000), 5);
        assert!(r.p < 0.05, "p={:.4}", r.p);
        assert!(r.lm_stat > 0.0);
        assert_eq!(r.lags, 5);
    }

    #[test]
    fn white_noise_statistic_is_well_formed() {
        let r = arch_lm_test(&gaussian_noise(1000, 3), 5);
        assert!(r.lm_stat.is_finite() && r.lm_stat >= 0.0);
        assert!((0.0..=1.0).contains(&r.p));
    }

    #[test]
    fn degenerate_input_is_neutral() {
        assert_eq!(arch_lm_test(&[], 5), ArchLmResult::neutral(5));
        assert_eq!(arch_lm_test(&[0.1; 100], 5), ArchLmResult::neutral(5));
        assert_eq!(arch_lm_test(&gaussian_noise(100, 1), 0), ArchLmResult::neutral(0));
        assert_eq!(arch_lm_test(&gaussian_noise(8, 1), 5), ArchLmResult::neutral(5));
    }

    #[test]
    fn huge_lag_is_neutral() {
        let noise = gaussian_noise(200, 3);
        for lags in [usize::MAX, usize::MAX / 2 + 1, 100] {
            assert_eq!(arch_lm_test(&noise, lags), ArchLmResult::neutral(lags));
        }
        // 2 * 99 + 2 = 200 observations is the smallest usable sample.
        assert!(arch_lm_test(&noise, 99).lm_stat.is_finite());
    }
}
