// =============================================================================
// Markov Transition Model — empirical regime transition probabilities
// =============================================================================
//
// Builds a row-stochastic matrix P[from][to] over a fixed regime alphabet
// from an observed label series:
//
//   1. Drop missing labels, keep the last `lookback` bars.
//   2. Fewer than two bars left            => uniform matrix.
//   3. Count consecutive (from, to) pairs where both labels are in the
//      alphabet; a pair touching any other label is ignored.
//   4. Normalise every row; a row with no observations becomes uniform.
//
// Every row of the result sums to one. Re-estimation always produces a new
// matrix.

use nalgebra::{DMatrix, RowDVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::types::{BarHorizon, LabelSequence, Regime, RegimeAlphabet};

/// Convergence tolerance for the stationary distribution.
const STATIONARY_TOLERANCE: f64 = 1e-12;

/// Iteration cap for the stationary distribution.
const STATIONARY_MAX_ITER: usize = 10_000;

// =============================================================================
// StateDistribution
// =============================================================================

/// Probability mass over an ordered set of regimes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDistribution {
    pub states: Vec<Regime>,
    pub probabilities: Vec<f64>,
}

impl StateDistribution {
    fn uniform(states: &[Regime]) -> Self {
        let p = if states.is_empty() {
            0.0
        } else {
            1.0 / states.len() as f64
        };
        Self {
            states: states.to_vec(),
            probabilities: vec![p; states.len()],
        }
    }

    /// Probability assigned to `regime` (`0.0` if it is not a state).
    pub fn get(&self, regime: Regime) -> f64 {
        self.states
            .iter()
            .position(|&s| s == regime)
            .map_or(0.0, |i| self.probabilities[i])
    }

    pub fn sum(&self) -> f64 {
        self.probabilities.iter().sum()
    }

    /// State with the highest probability; ties go to the earlier state.
    pub fn mode(&self) -> Option<Regime> {
        let mut best: Option<(Regime, f64)> = None;
        for (&s, &p) in self.states.iter().zip(&self.probabilities) {
            match best {
                Some((_, bp)) if p <= bp => {}
                _ => best = Some((s, p)),
            }
        }
        best.map(|(s, _)| s)
    }
}

// =============================================================================
// TransitionMatrix
// =============================================================================

/// Row-stochastic transition matrix indexed by the alphabet order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionMatrix {
    states: Vec<Regime>,
    rows: Vec<Vec<f64>>,
    /// Number of transitions that entered the counts.
    observations: usize,
}

impl TransitionMatrix {
    /// Every entry equal to `1 / |alphabet|`.
    pub fn uniform(alphabet: &RegimeAlphabet) -> Self {
        let k = alphabet.len();
        let p = if k == 0 { 0.0 } else { 1.0 / k as f64 };
        Self {
            states: alphabet.states().to_vec(),
            rows: vec![vec![p; k]; k],
            observations: 0,
        }
    }

    /// Estimate from a complete label sequence.
    pub fn from_labels(labels: &LabelSequence, alphabet: &RegimeAlphabet, lookback: usize) -> Self {
        build_transition_matrix(&labels.to_optional(), alphabet, lookback)
    }

    pub fn states(&self) -> &[Regime] {
        &self.states
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    fn index_of(&self, regime: Regime) -> Option<usize> {
        self.states.iter().position(|&s| s == regime)
    }

    /// `P(from -> to)`, `None` when either state is not in the matrix.
    pub fn probability(&self, from: Regime, to: Regime) -> Option<f64> {
        Some(self.rows[self.index_of(from)?][self.index_of(to)?])
    }

    /// Distribution of the next bar's regime given the current one.
    /// An unknown current state yields a uniform distribution.
    pub fn one_step(&self, current: Regime) -> StateDistribution {
        match self.index_of(current) {
            Some(i) => StateDistribution {
                states: self.states.clone(),
                probabilities: self.rows[i].clone(),
            },
            None => StateDistribution::uniform(&self.states),
        }
    }

    /// Most probable next regime from `current`.
    pub fn most_likely_next(&self, current: Regime) -> Option<Regime> {
        self.one_step(current).mode()
    }

    /// `1 / (1 - P(state -> state))`, infinite for an absorbing or unknown
    /// state.
    pub fn expected_duration(&self, state: Regime) -> BarHorizon {
        match self.probability(state, state) {
            Some(p) if p < 1.0 => BarHorizon::Finite(1.0 / (1.0 - p)),
            _ => BarHorizon::Infinite,
        }
    }

    fn as_dmatrix(&self) -> DMatrix<f64> {
        let k = self.states.len();
        DMatrix::from_fn(k, k, |i, j| self.rows[i][j])
    }

    /// Distribution `steps` bars ahead of `current`. Zero steps returns the
    /// point mass on `current` (uniform if `current` is unknown).
    pub fn n_step_probabilities(&self, current: Regime, steps: usize) -> StateDistribution {
        let k = self.states.len();
        let mut v = match self.index_of(current) {
            Some(i) => RowDVector::from_fn(k, |_, j| if j == i { 1.0 } else { 0.0 }),
            None => RowDVector::from_element(k, if k == 0 { 0.0 } else { 1.0 / k as f64 }),
        };
        let p = self.as_dmatrix();
        for _ in 0..steps {
            v = &v * &p;
        }
        StateDistribution {
            states: self.states.clone(),
            probabilities: v.iter().copied().collect(),
        }
    }

    /// Long-run share of time spent in each regime.
    ///
    /// Iterates the lazy chain `(P + I) / 2`, which shares the stationary
    /// distribution of `P` but cannot oscillate, starting from uniform.
    pub fn stationary_distribution(&self) -> StateDistribution {
        let k = self.states.len();
        if k == 0 {
            return StateDistribution::uniform(&self.states);
        }
        let lazy = (self.as_dmatrix() + DMatrix::<f64>::identity(k, k)) * 0.5;
        let mut v = RowDVector::from_element(k, 1.0 / k as f64);
        for _ in 0..STATIONARY_MAX_ITER {
            let next = &v * &lazy;
            let delta: f64 = (&next - &v).iter().map(|d| d.abs()).sum();
            v = next;
            if delta < STATIONARY_TOLERANCE {
                break;
            }
        }
        StateDistribution {
            states: self.states.clone(),
            probabilities: v.iter().copied().collect(),
        }
    }
}

// =============================================================================
// Free-function API
// =============================================================================

/// Estimate a transition matrix from `series` over `alphabet`, using the
/// last `lookback` defined labels.
pub fn build_transition_matrix(
    series: &[Option<Regime>],
    alphabet: &RegimeAlphabet,
    lookback: usize,
) -> TransitionMatrix {
    let defined: Vec<Regime> = series.iter().flatten().copied().collect();
    let window = &defined[defined.len().saturating_sub(lookback)..];

    if window.len() < 2 || alphabet.is_empty() {
        trace!(
            usable = window.len(),
            lookback,
            "transition matrix: insufficient data, using uniform"
        );
        return TransitionMatrix::uniform(alphabet);
    }

    let k = alphabet.len();
    let mut counts = vec![vec![0_usize; k]; k];
    let mut observations = 0_usize;
    let mut discarded = 0_usize;

    for pair in window.windows(2) {
        match (alphabet.index_of(pair[0]), alphabet.index_of(pair[1])) {
            (Some(i), Some(j)) => {
                counts[i][j] += 1;
                observations += 1;
            }
            _ => discarded += 1,
        }
    }

    let rows: Vec<Vec<f64>> = counts
        .iter()
        .map(|row| {
            let total: usize = row.iter().sum();
            if total == 0 {
                vec![1.0 / k as f64; k]
            } else {
                row.iter().map(|&c| c as f64 / total as f64).collect()
            }
        })
        .collect();

    debug!(
        states = k,
        observations,
        discarded,
        lookback,
        "transition matrix estimated"
    );

    TransitionMatrix {
        states: alphabet.states().to_vec(),
        rows,
        observations,
    }
}

/// Row of `matrix` for `current_state`, uniform when the state is unknown.
pub fn one_step_probabilities(matrix: &TransitionMatrix, current_state: Regime) -> StateDistribution {
    matrix.one_step(current_state)
}

/// Expected number of bars spent in `state` once entered.
pub fn expected_duration(matrix: &TransitionMatrix, state: Regime) -> BarHorizon {
    matrix.expected_duration(state)
}
