mod config;
pub mod raw;
mod resolver;
pub mod statistics;
mod strength;
mod tally;

pub use config::{
    BorderlinePolicy, ClarityThresholds, NeutralResponsePolicy, ScoringConfig, ScoringProfile,
};
pub use statistics::{DimensionStatistics, QualityLevel, StatisticalReport};
pub use strength::DimensionScore;
pub use tally::{DimensionCount, DimensionTally};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::catalog::QuestionCatalog;
use super::domain::{
    Answer, Dimension, Letter, PersonalityTypeCode, PreferenceStrength, QuestionId,
    SessionOutcome,
};

/// Stateless scorer applying one configuration to complete answer sets.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Engine with another threshold preset but the same instrument settings.
    pub fn with_profile(&self, profile: ScoringProfile) -> Self {
        Self::new(self.config.with_profile(profile))
    }

    /// Scores a complete set of forced-choice answers.
    pub fn score_answers(
        &self,
        catalog: &QuestionCatalog,
        answers: &[Answer],
    ) -> Result<ScoringResult, ScoringError> {
        let tallied = tally::tally_answers(catalog, answers, self.config.expected_question_count)?;
        let (type_code, resolved) = resolver::resolve_type(&tallied.tally);

        let dimensions: [DimensionScore; 4] = Dimension::ALL.map(|dimension| {
            strength::score_dimension(
                tallied.tally.get(dimension),
                resolved[dimension.index()],
                &self.config.thresholds,
            )
        });
        let borderline_dimensions =
            strength::borderline_dimensions(&dimensions, &self.config.borderline);

        let statistics = self.config.include_statistics.then(|| {
            StatisticalReport::compute(&dimensions, &tallied.responses, &borderline_dimensions)
        });

        debug!(
            type_code = %type_code,
            profile = self.config.profile.label(),
            borderline = borderline_dimensions.len(),
            "answers scored"
        );

        Ok(ScoringResult {
            type_code,
            profile: self.config.profile,
            dimensions,
            borderline_dimensions,
            total_answers: answers.len(),
            statistics,
        })
    }

    /// Scores raw 1-5 responses given in catalog order.
    pub fn score_raw_responses(
        &self,
        catalog: &QuestionCatalog,
        responses: &[i64],
    ) -> Result<ScoringResult, ScoringError> {
        let answers = self.answers_from_responses(catalog, responses)?;
        self.score_answers(catalog, &answers)
    }

    /// Converts raw 1-5 responses into forced-choice answers using the neutral policy.
    pub fn answers_from_responses(
        &self,
        catalog: &QuestionCatalog,
        responses: &[i64],
    ) -> Result<Vec<Answer>, ScoringError> {
        tally::check_catalog(catalog, self.config.expected_question_count)?;
        raw::answers_from_responses(
            catalog,
            responses,
            self.config.neutral_policy,
            self.config.expected_question_count,
        )
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

/// Immutable scoring output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub type_code: PersonalityTypeCode,
    pub profile: ScoringProfile,
    pub dimensions: [DimensionScore; 4],
    pub borderline_dimensions: Vec<Dimension>,
    pub total_answers: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<StatisticalReport>,
}

impl ScoringResult {
    pub fn dimension(&self, dimension: Dimension) -> &DimensionScore {
        &self.dimensions[dimension.index()]
    }

    pub fn clarity(&self, dimension: Dimension) -> PreferenceStrength {
        self.dimension(dimension).clarity
    }

    /// Share of each of the eight letters; the two letters of a pair sum to one.
    pub fn letter_percentages(&self) -> BTreeMap<Letter, f64> {
        self.dimensions
            .iter()
            .flat_map(|score| {
                [
                    (score.dimension.first(), score.first_share),
                    (score.dimension.second(), score.second_share),
                ]
            })
            .collect()
    }

    pub fn is_borderline(&self, dimension: Dimension) -> bool {
        self.borderline_dimensions.contains(&dimension)
    }

    /// Fields written back to the session store.
    pub fn outcome(&self, computed_at: DateTime<Utc>) -> SessionOutcome {
        SessionOutcome {
            type_code: self.type_code,
            strengths: self
                .dimensions
                .iter()
                .map(|score| (score.dimension, score.first_share))
                .collect(),
            clarity: self
                .dimensions
                .iter()
                .map(|score| (score.dimension, score.clarity))
                .collect(),
            computed_at,
        }
    }
}

/// Failures that abort a calculation before anything is written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("assessment incomplete: expected {expected} answers, found {found}")]
    IncompleteAssessment { expected: usize, found: usize },
    #[error("answer references unknown or inactive question {0}")]
    UnknownQuestion(QuestionId),
    #[error("question {0} was answered more than once")]
    DuplicateAnswer(QuestionId),
    #[error("invalid response value {value} at position {position}: expected an integer from 1 to 5")]
    InvalidResponseValue { position: usize, value: String },
    #[error("question catalog mismatch: {detail}")]
    CatalogMismatch { detail: String },
}
