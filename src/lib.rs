// =============================================================================
// Regime Engine — library root
// =============================================================================
//
// Classifies a price series into discrete market regimes bar by bar and
// models how those regimes evolve:
//
//   labelers          causal per-bar regime labels from rolling statistics
//   ensemble          majority consensus across labelers
//   markov            empirical transition matrix and expected durations
//   volatility_shift  dispersion change around regime flips
//   stats             formal tests (Hurst, variance ratio, ARCH-LM, ...)
//   engine            the whole pipeline for one symbol
// =============================================================================

pub mod config;
pub mod engine;
pub mod ensemble;
pub mod labelers;
pub mod market_data;
pub mod markov;
pub mod stats;
pub mod types;
pub mod volatility_shift;

pub use config::EngineConfig;
pub use engine::{Diagnostics, RegimeEngine, RegimeSummary};
pub use types::{BarHorizon, LabelSequence, Regime, RegimeAlphabet};
