// =============================================================================
// Ensemble Voter — majority consensus across labelers
// =============================================================================
//
// For every bar:
//   1. Count the votes of every labeler that has a label at that position
//      (shorter sequences abstain past their end).
//   2. Nobody voted            => random
//   3. A unique top count      => that label
//   4. A tie at the top count  => the previous bar's consensus, or random at
//                                 the very first bar
//
// Votes are tallied into a fixed array indexed by regime, so the outcome
// never depends on the order in which labelers are supplied.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{LabelSequence, Regime};

/// Consensus labels plus the share of voters that backed each one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consensus {
    pub labels: LabelSequence,
    /// Fraction of voting labelers whose label equals the consensus, per bar.
    /// `0.0` where nobody voted.
    pub agreement: Vec<f64>,
}

impl Consensus {
    /// Agreement at the last bar, `0.0` for an empty consensus.
    pub fn latest_agreement(&self) -> f64 {
        self.agreement.last().copied().unwrap_or(0.0)
    }
}

/// Majority vote across label sequences.
pub fn vote<'a, I>(sequences: I) -> LabelSequence
where
    I: IntoIterator<Item = &'a LabelSequence>,
{
    vote_with_agreement(sequences).labels
}

/// Majority vote that also reports per-bar agreement.
pub fn vote_with_agreement<'a, I>(sequences: I) -> Consensus
where
    I: IntoIterator<Item = &'a LabelSequence>,
{
    let sequences: Vec<&LabelSequence> = sequences.into_iter().collect();
    let len = sequences.iter().map(|s| s.len()).max().unwrap_or(0);

    let mut labels: Vec<Regime> = Vec::with_capacity(len);
    let mut agreement: Vec<f64> = Vec::with_capacity(len);
    let mut ties = 0_usize;

    for t in 0..len {
        let mut counts = [0_usize; Regime::ALL.len()];
        let mut voters = 0_usize;
        for seq in &sequences {
            if let Some(r) = seq.get(t) {
                counts[r.ordinal()] += 1;
                voters += 1;
            }
        }

        let top = counts.iter().copied().max().unwrap_or(0);
        let leaders: Vec<Regime> = Regime::ALL
            .iter()
            .copied()
            .filter(|r| top > 0 && counts[r.ordinal()] == top)
            .collect();

        let chosen = match leaders.as_slice() {
            [] => Regime::Random,
            [single] => *single,
            _ => {
                ties += 1;
                labels.last().copied().unwrap_or(Regime::Random)
            }
        };

        let share = if voters == 0 {
            0.0
        } else {
            counts[chosen.ordinal()] as f64 / voters as f64
        };

        labels.push(chosen);
        agreement.push(share);
    }

    debug!(
        voters = sequences.len(),
        bars = len,
        ties,
        last = ?labels.last(),
        "ensemble vote complete"
    );

    Consensus {
        labels: labels.into(),
        agreement,
    }
}
