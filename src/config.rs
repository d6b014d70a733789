// =============================================================================
// Engine Configuration — explicit, immutable analysis parameters
// =============================================================================
//
// Every tunable parameter of the regime engine lives here and is handed to
// each component explicitly; nothing reads process-wide state.
//
// Persistence uses an atomic tmp + rename pattern. All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an older
// config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::labelers::LabelerWindows;
use crate::types::RegimeAlphabet;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_markov_lookback() -> usize {
    250
}

fn default_flip_half_window() -> usize {
    10
}

fn default_variance_ratio_lags() -> Vec<usize> {
    vec![2, 4, 8, 16]
}

fn default_arch_lm_lags() -> usize {
    5
}

fn default_rolling_window() -> usize {
    100
}

fn default_rolling_step() -> usize {
    10
}

fn default_volatility_expansion_threshold() -> f64 {
    1.25
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Parameters for one regime analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Regimes the transition model is estimated over.
    #[serde(default)]
    pub alphabet: RegimeAlphabet,

    /// Rolling window per labeler.
    #[serde(default)]
    pub labeler_windows: LabelerWindows,

    /// Number of most recent consensus bars used for the transition matrix.
    #[serde(default = "default_markov_lookback")]
    pub markov_lookback: usize,

    /// Bars on each side of a regime flip for the volatility comparison.
    #[serde(default = "default_flip_half_window")]
    pub flip_half_window: usize,

    /// Lags for the variance-ratio diagnostics.
    #[serde(default = "default_variance_ratio_lags")]
    pub variance_ratio_lags: Vec<usize>,

    /// Lags for the ARCH-LM diagnostic.
    #[serde(default = "default_arch_lm_lags")]
    pub arch_lm_lags: usize,

    /// Window and step of the rolling skew/kurtosis table.
    #[serde(default = "default_rolling_window")]
    pub rolling_window: usize,

    #[serde(default = "default_rolling_step")]
    pub rolling_step: usize,

    /// Flip volatility ratio above which a shift counts as an expansion.
    #[serde(default = "default_volatility_expansion_threshold")]
    pub volatility_expansion_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alphabet: RegimeAlphabet::canonical(),
            labeler_windows: LabelerWindows::default(),
            markov_lookback: default_markov_lookback(),
            flip_half_window: default_flip_half_window(),
            variance_ratio_lags: default_variance_ratio_lags(),
            arch_lm_lags: default_arch_lm_lags(),
            rolling_window: default_rolling_window(),
            rolling_step: default_rolling_step(),
            volatility_expansion_threshold: default_volatility_expansion_threshold(),
        }
    }
}

impl EngineConfig {
    /// Reject parameter combinations that would make every result neutral.
    pub fn validate(&self) -> Result<()> {
        if self.alphabet.is_empty() {
            bail!("alphabet must contain at least one regime");
        }
        let w = &self.labeler_windows;
        if w.acf == 0 || w.vr_like == 0 || w.drift == 0 {
            bail!("labeler windows must be positive (got {:?})", w);
        }
        if self.markov_lookback < 2 {
            bail!("markov_lookback must be at least 2 (got {})", self.markov_lookback);
        }
        if self.flip_half_window == 0 {
            bail!("flip_half_window must be positive");
        }
        if self.rolling_window == 0 || self.rolling_step == 0 {
            bail!("rolling window and step must be positive");
        }
        if !self.volatility_expansion_threshold.is_finite()
            || self.volatility_expansion_threshold <= 0.0
        {
            bail!(
                "volatility_expansion_threshold must be a positive number (got {})",
                self.volatility_expansion_threshold
            );
        }
        Ok(())
    }

    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse engine config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid engine config in {}", path.display()))?;

        info!(
            path = %path.display(),
            alphabet = ?config.alphabet.states(),
            lookback = config.markov_lookback,
            "engine config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise engine config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "engine config saved (atomic)");
        Ok(())
    }
}
