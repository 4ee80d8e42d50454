use serde::{Deserialize, Serialize};

use super::super::domain::{Dimension, Letter, PreferenceStrength};
use super::config::{BorderlinePolicy, ClarityThresholds};
use super::resolver::ResolvedDimension;
use super::statistics::{confidence_level, standard_error};
use super::tally::DimensionCount;

/// Counts, shares and clarity for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub first_count: u32,
    pub second_count: u32,
    pub preferred: Letter,
    pub tie_broken: bool,
    /// Winning share, always within [0.5, 1.0].
    pub strength: f64,
    pub first_share: f64,
    pub second_share: f64,
    pub clarity: PreferenceStrength,
}

impl DimensionScore {
    pub fn total(&self) -> u32 {
        self.first_count + self.second_count
    }

    pub fn winning_count(&self) -> u32 {
        self.first_count.max(self.second_count)
    }

    pub fn share_of(&self, letter: Letter) -> f64 {
        if letter == self.dimension.first() {
            self.first_share
        } else {
            self.second_share
        }
    }
}

pub(crate) fn score_dimension(
    count: DimensionCount,
    resolved: ResolvedDimension,
    thresholds: &ClarityThresholds,
) -> DimensionScore {
    let first_share = count.share_first();
    let second_share = 1.0 - first_share;
    let strength = first_share.max(second_share);

    DimensionScore {
        dimension: count.dimension,
        first_count: count.first,
        second_count: count.second,
        preferred: resolved.letter,
        tie_broken: resolved.tie_broken,
        strength,
        first_share,
        second_share,
        clarity: thresholds.classify(strength),
    }
}

pub(crate) fn is_borderline(score: &DimensionScore, policy: &BorderlinePolicy) -> bool {
    match *policy {
        BorderlinePolicy::WinningShare { threshold } => score.strength < threshold,
        BorderlinePolicy::Statistical {
            neutral_band,
            min_confidence,
            max_standard_error,
        } => {
            let total = score.total();
            let confidence = confidence_level(score.winning_count(), total);
            let error = standard_error(score.strength, total);
            (score.strength - 0.5).abs() < neutral_band
                || (confidence < min_confidence && error > max_standard_error)
        }
    }
}

pub(crate) fn borderline_dimensions(
    scores: &[DimensionScore],
    policy: &BorderlinePolicy,
) -> Vec<Dimension> {
    scores
        .iter()
        .filter(|score| is_borderline(score, policy))
        .map(|score| score.dimension)
        .collect()
}
