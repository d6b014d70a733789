// =============================================================================
// Shared types used across the regime engine
// =============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Regime
// =============================================================================

/// Discrete market regime label.
///
/// The core labelers and voter only ever produce the first three variants.
/// `VolatileTrending` exists for consumers that want to distinguish a trend
/// accompanied by a volatility expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Persistent directional move.
    Trending,
    /// Anti-persistent, self-correcting price action.
    MeanReverting,
    /// No detectable structure.
    Random,
    /// Trend accompanied by expanding volatility.
    VolatileTrending,
}

impl Regime {
    /// Every regime in canonical order.
    pub const ALL: [Regime; 4] = [
        Regime::Trending,
        Regime::MeanReverting,
        Regime::Random,
        Regime::VolatileTrending,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trending => "trending",
            Self::MeanReverting => "mean_reverting",
            Self::Random => "random",
            Self::VolatileTrending => "volatile_trending",
        }
    }

    /// Position in [`Regime::ALL`].
    pub(crate) fn ordinal(self) -> usize {
        match self {
            Self::Trending => 0,
            Self::MeanReverting => 1,
            Self::Random => 2,
            Self::VolatileTrending => 3,
        }
    }

    /// Parse a label, mapping anything unrecognised to `Random`.
    pub fn parse_or_random(text: &str) -> Self {
        text.parse().unwrap_or(Self::Random)
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a label is not one of the known regimes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRegime(pub String);

impl fmt::Display for UnknownRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown regime label: {:?}", self.0)
    }
}

impl std::error::Error for UnknownRegime {}

impl FromStr for Regime {
    type Err = UnknownRegime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trending" => Ok(Self::Trending),
            "mean_reverting" => Ok(Self::MeanReverting),
            "random" => Ok(Self::Random),
            "volatile_trending" => Ok(Self::VolatileTrending),
            _ => Err(UnknownRegime(s.to_string())),
        }
    }
}

// =============================================================================
// RegimeAlphabet
// =============================================================================

/// Ordered, duplicate-free set of regimes a model is allowed to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Regime>", into = "Vec<Regime>")]
pub struct RegimeAlphabet {
    states: Vec<Regime>,
}

impl RegimeAlphabet {
    /// Build an alphabet, keeping the first occurrence of each regime.
    pub fn new(states: impl IntoIterator<Item = Regime>) -> Self {
        let mut unique: Vec<Regime> = Vec::new();
        for s in states {
            if !unique.contains(&s) {
                unique.push(s);
            }
        }
        Self { states: unique }
    }

    /// `{trending, mean_reverting, random}`.
    pub fn canonical() -> Self {
        Self::new([Regime::Trending, Regime::MeanReverting, Regime::Random])
    }

    pub fn states(&self) -> &[Regime] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn contains(&self, regime: Regime) -> bool {
        self.states.contains(&regime)
    }

    pub fn index_of(&self, regime: Regime) -> Option<usize> {
        self.states.iter().position(|&s| s == regime)
    }
}

impl Default for RegimeAlphabet {
    fn default() -> Self {
        Self::canonical()
    }
}

impl From<Vec<Regime>> for RegimeAlphabet {
    fn from(states: Vec<Regime>) -> Self {
        Self::new(states)
    }
}

impl From<RegimeAlphabet> for Vec<Regime> {
    fn from(alphabet: RegimeAlphabet) -> Self {
        alphabet.states
    }
}

// =============================================================================
// LabelSequence
// =============================================================================

/// One regime per bar, aligned by position with the price series it was
/// derived from. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSequence(Vec<Regime>);

impl LabelSequence {
    pub fn new(labels: Vec<Regime>) -> Self {
        Self(labels)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Regime> {
        self.0.get(index).copied()
    }

    pub fn last(&self) -> Option<Regime> {
        self.0.last().copied()
    }

    pub fn as_slice(&self) -> &[Regime] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Regime> + '_ {
        self.0.iter().copied()
    }

    /// Labels as an optional series, the shape the transition builder reads.
    pub fn to_optional(&self) -> Vec<Option<Regime>> {
        self.0.iter().map(|&r| Some(r)).collect()
    }

    /// First `n` labels (or all of them when shorter).
    pub fn prefix(&self, n: usize) -> LabelSequence {
        LabelSequence(self.0[..n.min(self.0.len())].to_vec())
    }
}

impl From<Vec<Regime>> for LabelSequence {
    fn from(labels: Vec<Regime>) -> Self {
        Self(labels)
    }
}

impl FromIterator<Regime> for LabelSequence {
    fn from_iter<I: IntoIterator<Item = Regime>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// BarHorizon
// =============================================================================

/// A bar count that may be unbounded.
///
/// Used for expected regime durations and mean-reversion half-lives so that
/// "never" is a value rather than a floating-point infinity. Variant order
/// makes `Infinite` compare greater than every finite horizon.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarHorizon {
    Finite(f64),
    Infinite,
}

impl BarHorizon {
    pub fn is_infinite(self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// The finite bar count, if any.
    pub fn bars(self) -> Option<f64> {
        match self {
            Self::Finite(b) => Some(b),
            Self::Infinite => None,
        }
    }
}

impl fmt::Display for BarHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(b) => write!(f, "{:.2} bars", b),
            Self::Infinite => write!(f, "infinite"),
        }
    }
}
