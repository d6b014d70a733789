// =============================================================================
// Statistical Test Library
// =============================================================================
//
// Stateless, deterministic estimators used to characterise a return or price
// series:
// - Hurst exponent (rescaled range with CI, detrended fluctuation analysis)
// - Lo–MacKinlay variance ratio (single and multi-lag)
// - Engle's ARCH-LM test for volatility clustering
// - First-lag autocorrelation and AR(1) half-life
// - Rolling Hurst / skewness / kurtosis tables and a stability index
//
// Nothing here returns an error. Empty, short, flat or otherwise degenerate
// input yields the documented neutral value of each function.

pub mod arch;
pub mod autocorrelation;
pub mod descriptive;
pub mod hurst;
pub mod moments;
pub mod variance_ratio;

#[cfg(test)]
pub(crate) mod test_support;

pub use arch::{arch_lm_test, ArchLmResult};
pub use autocorrelation::{acf, acf1, half_life_ar1};
pub use descriptive::{linear_fit, mean, sample_std, sample_variance, LinearFit};
pub use hurst::{hurst_dfa, hurst_rs, HurstEstimate};
pub use moments::{
    rolling_hurst, rolling_skew_kurt, skew_kurt, skew_kurt_stability_index, RollingHurstRow,
    SkewKurtRow,
};
pub use variance_ratio::{variance_ratio, variance_ratio_multi, VarianceRatio};
