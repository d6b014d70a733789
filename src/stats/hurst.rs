// =============================================================================
// Hurst Exponent — Rescaled Range (R/S) and Detrended Fluctuation Analysis
// =============================================================================
//
// The Hurst exponent H characterises the long-term memory of a series:
//
//   H > 0.5  =>  persistent (trend-following increments)
//   H ~ 0.5  =>  independent increments (random walk)
//   H < 0.5  =>  anti-persistent (mean-reverting increments)
//
// R/S algorithm:
//   1. For each window size n in {8, 16, 32, ...} up to the series length:
//      a. Split the series into non-overlapping chunks of length n.
//      b. Per chunk: R = range of the cumulative deviation from the chunk
//         mean, S = population standard deviation, skip chunks with S == 0.
//      c. Average R/S across chunks.
//   2. OLS of log(avg R/S) on log(n); the slope is H, its standard error
//      gives a 95% interval.
//
// DFA algorithm:
//   1. Integrate the demeaned series into a profile.
//   2. For each scale s in {4, 8, 16, ...} with at least two segments, fit a
//      line to each segment and take the RMS of the residuals, F(s).
//   3. The slope of log F(s) on log s is the scaling exponent.
//
// Both estimates are clamped to [0, 1]. Short or flat input yields the
// neutral estimate H = 0.5 (with a [0, 1] interval for R/S).

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::descriptive::{finite_only, linear_fit, mean, population_variance};

/// Minimum number of finite points for the R/S estimate.
pub const MIN_RS_POINTS: usize = 20;

/// Minimum number of finite points for the DFA estimate.
pub const MIN_DFA_POINTS: usize = 16;

/// Smallest R/S chunk length.
const RS_MIN_WINDOW: usize = 8;

/// Smallest DFA segment length.
const DFA_MIN_SCALE: usize = 4;

/// Two-sided 95% normal quantile.
const Z_95: f64 = 1.959_963_984_540_054;

/// Rescaled-range Hurst estimate with a 95% confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HurstEstimate {
    pub h: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    /// Number of window sizes that entered the regression.
    pub points: usize,
}

impl HurstEstimate {
    /// Random-walk centred estimate with the widest interval.
    pub fn neutral() -> Self {
        Self {
            h: 0.5,
            ci_low: 0.0,
            ci_high: 1.0,
            points: 0,
        }
    }
}

/// Rescaled-range Hurst exponent of `series`.
pub fn hurst_rs(series: &[f64]) -> HurstEstimate {
    let data = finite_only(series);
    if data.len() < MIN_RS_POINTS {
        trace!(
            len = data.len(),
            min = MIN_RS_POINTS,
            "Hurst R/S: insufficient data"
        );
        return HurstEstimate::neutral();
    }

    let mut log_n: Vec<f64> = Vec::new();
    let mut log_rs: Vec<f64> = Vec::new();

    let mut window = RS_MIN_WINDOW;
    while window <= data.len() {
        if let Some(avg_rs) = average_rescaled_range(&data, window) {
            log_n.push((window as f64).ln());
            log_rs.push(avg_rs.ln());
        }
        window *= 2;
    }

    let fit = match linear_fit(&log_n, &log_rs) {
        Some(fit) if fit.slope.is_finite() => fit,
        _ => {
            trace!(points = log_n.len(), "Hurst R/S: degenerate regression");
            return HurstEstimate::neutral();
        }
    };

    let h = fit.slope.clamp(0.0, 1.0);
    let (ci_low, ci_high) = match fit.slope_std_err {
        Some(se) if se.is_finite() => (
            (fit.slope - Z_95 * se).clamp(0.0, 1.0),
            (fit.slope + Z_95 * se).clamp(0.0, 1.0),
        ),
        _ => (0.0, 1.0),
    };

    trace!(
        hurst = format!("{:.4}", h),
        points = log_n.len(),
        "Hurst R/S computed"
    );

    HurstEstimate {
        h,
        ci_low,
        ci_high,
        points: log_n.len(),
    }
}

/// Mean R/S statistic over the non-overlapping chunks of length `window`.
/// `None` when every chunk is flat.
fn average_rescaled_range(data: &[f64], window: usize) -> Option<f64> {
    let mut rs_sum = 0.0_f64;
    let mut valid_chunks = 0_usize;

    for chunk in data.chunks_exact(window) {
        let std_dev = population_variance(chunk).sqrt();
        if std_dev < f64::EPSILON {
            continue;
        }

        let m = mean(chunk);
        let mut running = 0.0_f64;
        let mut hi = f64::NEG_INFINITY;
        let mut lo = f64::INFINITY;
        for &v in chunk {
            running += v - m;
            hi = hi.max(running);
            lo = lo.min(running);
        }

        let rs = (hi - lo) / std_dev;
        if rs > 0.0 && rs.is_finite() {
            rs_sum += rs;
            valid_chunks += 1;
        }
    }

    if valid_chunks == 0 {
        None
    } else {
        Some(rs_sum / valid_chunks as f64)
    }
}

/// Detrended-fluctuation-analysis scaling exponent of `series`, clamped to
/// `[0, 1]`.
pub fn hurst_dfa(series: &[f64]) -> f64 {
    let data = finite_only(series);
    if data.len() < MIN_DFA_POINTS {
        trace!(
            len = data.len(),
            min = MIN_DFA_POINTS,
            "Hurst DFA: insufficient data"
        );
        return 0.5;
    }

    let m = mean(&data);
    let mut profile = Vec::with_capacity(data.len());
    let mut running = 0.0_f64;
    for v in &data {
        running += v - m;
        profile.push(running);
    }

    let mut log_s: Vec<f64> = Vec::new();
    let mut log_f: Vec<f64> = Vec::new();

    let mut scale = DFA_MIN_SCALE;
    while profile.len() / scale >= 2 {
        if let Some(f) = fluctuation(&profile, scale) {
            log_s.push((scale as f64).ln());
            log_f.push(f.ln());
        }
        scale *= 2;
    }

    match linear_fit(&log_s, &log_f) {
        Some(fit) if fit.slope.is_finite() => {
            let h = fit.slope.clamp(0.0, 1.0);
            trace!(
                hurst = format!("{:.4}", h),
                scales = log_s.len(),
                "Hurst DFA computed"
            );
            h
        }
        _ => {
            trace!(scales = log_s.len(), "Hurst DFA: degenerate regression");
            0.5
        }
    }
}

/// Root-mean-square residual of linear detrending over segments of `scale`.
/// `None` when the profile is perfectly linear at this scale.
fn fluctuation(profile: &[f64], scale: usize) -> Option<f64> {
    let x: Vec<f64> = (0..scale).map(|i| i as f64).collect();
    let mut sum_sq = 0.0_f64;
    let mut count = 0_usize;

    for segment in profile.chunks_exact(scale) {
        let fit = linear_fit(&x, segment)?;
        for (xi, yi) in x.iter().zip(segment) {
            let r = yi - fit.intercept - fit.slope * xi;
            sum_sq += r * r;
        }
        count += scale;
    }

    if count == 0 {
        return None;
    }
    let f = (sum_sq / count as f64).sqrt();
    if f > f64::EPSILON && f.is_finite() {
        Some(f)
    } else {
        None
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::test_support::{gaussian_noise, random_walk};

    /// Increments that keep their sign for long stretches.
    fn persistent_increments(len: usize) -> Vec<f64> {
        let noise = gaussian_noise(len, 7);
        let mut out = Vec::with_capacity(len);
        let mut state = 0.0;
        for e in noise {
            state = 0.9 * state + e;
            out.push(state);
        }
        out
    }

    #[test]
    fn short_input_is_neutral() {
        for len in 0..MIN_RS_POINTS {
            let est = hurst_rs(&vec![1.0; len]);
            assert_eq!(est, HurstEstimate::neutral());
        }
        assert_eq!(hurst_dfa(&[1.0, 2.0]), 0.5);
    }

    #[test]
    fn flat_series_is_neutral() {
        assert_eq!(hurst_rs(&[42.0; 256]), HurstEstimate::neutral());
        assert_eq!(hurst_dfa(&[42.0; 256]), 0.5);
    }

    #[test]
    fn white_noise_near_half() {
        let noise = gaussian_noise(1024, 11);
        let rs = hurst_rs(&noise);
        assert!((0.3..=0.8).contains(&rs.h), "R/S H={:.4}", rs.h);
        let dfa = hurst_dfa(&noise);
        assert!((0.3..=0.7).contains(&dfa), "DFA H={:.4}", dfa);
    }

    #[test]
    fn persistent_increments_score_high() {
        let series = persistent_increments(1024);
        assert!(hurst_rs(&series).h > 0.6);
        assert!(hurst_dfa(&series) > 0.6);
    }

    #[test]
    fn random_walk_levels_saturate_dfa() {
        let walk = random_walk(1024, 3);
        assert!(hurst_dfa(&walk) > 0.9);
    }

    #[test]
    fn interval_brackets_estimate() {
        let est = hurst_rs(&gaussian_noise(512, 5));
        assert!(est.ci_low <= est.h && est.h <= est.ci_high);
        assert!(est.points >= 3);
        assert!((0.0..=1.0).contains(&est.ci_low));
        assert!((0.0..=1.0).contains(&est.ci_high));
    }

    #[test]
    fn non_finite_values_are_ignored() {
        let mut noise = gaussian_noise(300, 9);
        let clean = hurst_rs(&noise);
        noise.insert(0, f64::NAN);
        assert_eq!(hurst_rs(&noise), clean);
    }

    #[test]
    fn test_determinism() {
        let series = gaussian_noise(400, 21);
        assert_eq!(hurst_rs(&series), hurst_rs(&series));
        assert_eq!(hurst_dfa(&series), hurst_dfa(&series));
    }
}
