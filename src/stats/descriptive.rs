// =============================================================================
// Descriptive statistics and simple regression
// =============================================================================
//
// Small building blocks shared by the statistical tests and the labelers.
// Every function tolerates empty input and returns a neutral value (or
// `None`) instead of dividing by zero.

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance (divisor `n`); `0.0` for an empty slice.
pub fn population_variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64
}

/// Sample variance (divisor `n - 1`); `None` for fewer than two points.
pub fn sample_variance(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let m = mean(data);
    Some(data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64)
}

/// Sample standard deviation (divisor `n - 1`); `None` for fewer than two
/// points.
pub fn sample_std(data: &[f64]) -> Option<f64> {
    sample_variance(data).map(f64::sqrt)
}

/// True when every value is finite.
pub fn all_finite(data: &[f64]) -> bool {
    data.iter().all(|x| x.is_finite())
}

/// Copy of `data` with non-finite values removed.
pub fn finite_only(data: &[f64]) -> Vec<f64> {
    data.iter().copied().filter(|x| x.is_finite()).collect()
}

/// Result of a simple least-squares fit `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    /// Standard error of the slope; `None` with fewer than three points.
    pub slope_std_err: Option<f64>,
}

/// Ordinary least squares of `y` on `x`.
///
/// Returns `None` when the inputs differ in length, hold fewer than two
/// points, or `x` has no spread.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let x_mean = mean(x);
    let y_mean = mean(y);

    let mut sxy = 0.0_f64;
    let mut sxx = 0.0_f64;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        sxy += dx * (yi - y_mean);
        sxx += dx * dx;
    }

    if sxx.abs() < f64::EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let slope_std_err = if x.len() > 2 {
        let sse: f64 = x
            .iter()
            .zip(y)
            .map(|(xi, yi)| (yi - intercept - slope * xi).powi(2))
            .sum();
        Some((sse / (n - 2.0) / sxx).sqrt())
    } else {
        None
    };

    Some(LinearFit {
        intercept,
        slope,
        slope_std_err,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_neutral() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_variance(&[]), 0.0);
        assert!(sample_variance(&[1.0]).is_none());
        assert!(sample_std(&[]).is_none());
    }

    #[test]
    fn sample_vs_population_variance() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_variance(&data) - 4.0).abs() < 1e-12);
        assert!((sample_variance(&data).unwrap() - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn linear_fit_recovers_line() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v).collect();
        let fit = linear_fit(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
        assert!(fit.slope_std_err.unwrap() < 1e-9);
    }

    #[test]
    fn linear_fit_rejects_degenerate_x() {
        assert!(linear_fit(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(linear_fit(&[1.0], &[1.0]).is_none());
        assert!(linear_fit(&[1.0, 2.0], &[1.0]).is_none());
    }

    #[test]
    fn finite_filtering() {
        let data = [1.0, f64::NAN, 2.0, f64::INFINITY];
        assert!(!all_finite(&data));
        assert_eq!(finite_only(&data), vec![1.0, 2.0]);
    }
}
