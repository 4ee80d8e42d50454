//! Seeded synthetic responders used to check the scorer end to end.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use super::catalog::QuestionCatalog;
use super::domain::{AnswerOption, Dimension, Letter, PersonalityTypeCode};
use super::scoring::raw::{MAX_RESPONSE, MIN_RESPONSE, NEUTRAL_RESPONSE};
use super::scoring::{ScoringEngine, ScoringError};

pub const CONSISTENCY_LEVELS: [f64; 4] = [0.7, 0.8, 0.9, 0.95];

/// Generates 1-5 responses leaning toward `target`, one per active question.
///
/// With probability `consistency` a response agrees with the target letter; otherwise it is
/// drawn uniformly from the whole scale.
pub fn generate_responses<R: Rng>(
    catalog: &QuestionCatalog,
    target: PersonalityTypeCode,
    consistency: f64,
    rng: &mut R,
) -> Vec<i64> {
    catalog
        .active_questions()
        .map(|question| {
            let wants_a = question.letter_for(AnswerOption::A) == target.letter(question.dimension);
            if rng.gen::<f64>() < consistency {
                if wants_a {
                    rng.gen_range(MIN_RESPONSE..=2)
                } else {
                    rng.gen_range(4..=MAX_RESPONSE)
                }
            } else {
                rng.gen_range(MIN_RESPONSE..=MAX_RESPONSE)
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AccuracyTally {
    pub correct: usize,
    pub total: usize,
}

impl AccuracyTally {
    fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyAccuracy {
    pub consistency: f64,
    pub tally: AccuracyTally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub seed: u64,
    pub total_tests: usize,
    pub correct_predictions: usize,
    pub overall_accuracy: f64,
    pub by_type: BTreeMap<PersonalityTypeCode, AccuracyTally>,
    pub by_consistency: Vec<ConsistencyAccuracy>,
    pub dimension_accuracy: BTreeMap<Dimension, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeCaseOutcome {
    pub name: &'static str,
    pub responses: Vec<i64>,
    pub personality_type: Option<PersonalityTypeCode>,
    pub strengths: BTreeMap<Letter, f64>,
    pub borderline_dimensions: Vec<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionReport {
    pub seed: u64,
    pub samples: usize,
    pub unique_types: usize,
    pub type_counts: BTreeMap<PersonalityTypeCode, usize>,
    pub letter_counts: BTreeMap<Letter, usize>,
    /// Share of the first letter of each pair across all samples.
    pub first_letter_share: BTreeMap<Dimension, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarnessReport {
    pub accuracy: AccuracyReport,
    pub edge_cases: Vec<EdgeCaseOutcome>,
    pub distribution: DistributionReport,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SampleOutcome {
    target: PersonalityTypeCode,
    consistency_index: usize,
    predicted: PersonalityTypeCode,
}

/// Runs accuracy, edge-case and distribution checks against one engine and catalog.
pub struct ValidationHarness<'a> {
    engine: &'a ScoringEngine,
    catalog: &'a QuestionCatalog,
}

impl<'a> ValidationHarness<'a> {
    pub fn new(engine: &'a ScoringEngine, catalog: &'a QuestionCatalog) -> Self {
        Self { engine, catalog }
    }

    fn sample(&self, seed: u64, index: usize) -> Result<SampleOutcome, ScoringError> {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
        let types = PersonalityTypeCode::all();
        let target = types[rng.gen_range(0..types.len())];
        let consistency_index = rng.gen_range(0..CONSISTENCY_LEVELS.len());
        let responses = generate_responses(
            self.catalog,
            target,
            CONSISTENCY_LEVELS[consistency_index],
            &mut rng,
        );
        let result = self.engine.score_raw_responses(self.catalog, &responses)?;

        Ok(SampleOutcome {
            target,
            consistency_index,
            predicted: result.type_code,
        })
    }

    /// Scores `samples` synthetic respondents; identical seeds give identical reports.
    pub fn accuracy(&self, samples: usize, seed: u64) -> Result<AccuracyReport, ScoringError> {
        let outcomes = (0..samples)
            .into_par_iter()
            .map(|index| self.sample(seed, index))
            .collect::<Result<Vec<_>, _>>()?;

        let mut by_type: BTreeMap<PersonalityTypeCode, AccuracyTally> = PersonalityTypeCode::all()
            .into_iter()
            .map(|code| (code, AccuracyTally::default()))
            .collect();
        let mut by_consistency = [AccuracyTally::default(); CONSISTENCY_LEVELS.len()];
        let mut dimension_hits = [0usize; 4];
        let mut correct_predictions = 0;

        for outcome in &outcomes {
            let correct = outcome.predicted == outcome.target;
            if correct {
                correct_predictions += 1;
            }
            by_type.entry(outcome.target).or_default().record(correct);
            by_consistency[outcome.consistency_index].record(correct);
            for dimension in Dimension::ALL {
                if outcome.predicted.letter(dimension) == outcome.target.letter(dimension) {
                    dimension_hits[dimension.index()] += 1;
                }
            }
        }

        let ratio = |count: usize| {
            if samples == 0 {
                0.0
            } else {
                count as f64 / samples as f64
            }
        };

        Ok(AccuracyReport {
            seed,
            total_tests: samples,
            correct_predictions,
            overall_accuracy: ratio(correct_predictions),
            by_type,
            by_consistency: CONSISTENCY_LEVELS
                .iter()
                .zip(by_consistency)
                .map(|(consistency, tally)| ConsistencyAccuracy {
                    consistency: *consistency,
                    tally,
                })
                .collect(),
            dimension_accuracy: Dimension::ALL
                .iter()
                .map(|dimension| (*dimension, ratio(dimension_hits[dimension.index()])))
                .collect(),
        })
    }

    /// Boundary inputs: all neutral, all 5, all 1, alternating 1/5 and one seeded random set.
    pub fn edge_cases(&self, seed: u64) -> Vec<EdgeCaseOutcome> {
        let count = self.engine.config().expected_question_count;
        let mut rng = StdRng::seed_from_u64(seed);
        let cases: Vec<(&'static str, Vec<i64>)> = vec![
            ("all_neutral", vec![NEUTRAL_RESPONSE; count]),
            ("all_strongly_agree", vec![MAX_RESPONSE; count]),
            ("all_strongly_disagree", vec![MIN_RESPONSE; count]),
            (
                "alternating_extreme",
                (0..count)
                    .map(|index| if index % 2 == 0 { MIN_RESPONSE } else { MAX_RESPONSE })
                    .collect(),
            ),
            (
                "random_responses",
                (0..count)
                    .map(|_| rng.gen_range(MIN_RESPONSE..=MAX_RESPONSE))
                    .collect(),
            ),
        ];

        cases
            .into_iter()
            .map(|(name, responses)| {
                match self.engine.score_raw_responses(self.catalog, &responses) {
                    Ok(result) => EdgeCaseOutcome {
                        name,
                        personality_type: Some(result.type_code),
                        strengths: result.letter_percentages(),
                        borderline_dimensions: result.borderline_dimensions.clone(),
                        responses,
                        error: None,
                    },
                    Err(error) => EdgeCaseOutcome {
                        name,
                        responses,
                        personality_type: None,
                        strengths: BTreeMap::new(),
                        borderline_dimensions: Vec::new(),
                        error: Some(error.to_string()),
                    },
                }
            })
            .collect()
    }

    /// Type distribution produced by uniformly random responses.
    pub fn random_distribution(
        &self,
        samples: usize,
        seed: u64,
    ) -> Result<DistributionReport, ScoringError> {
        let count = self.engine.config().expected_question_count;
        let types = (0..samples)
            .into_par_iter()
            .map(|index| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
                let responses: Vec<i64> = (0..count)
                    .map(|_| rng.gen_range(MIN_RESPONSE..=MAX_RESPONSE))
                    .collect();
                self.engine
                    .score_raw_responses(self.catalog, &responses)
                    .map(|result| result.type_code)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut type_counts: BTreeMap<PersonalityTypeCode, usize> = BTreeMap::new();
        let mut letter_counts: BTreeMap<Letter, usize> = BTreeMap::new();
        for code in &types {
            *type_counts.entry(*code).or_default() += 1;
            for letter in code.letters() {
                *letter_counts.entry(letter).or_default() += 1;
            }
        }

        let first_letter_share = Dimension::ALL
            .iter()
            .map(|dimension| {
                let first = letter_counts.get(&dimension.first()).copied().unwrap_or(0);
                let share = if samples == 0 {
                    0.0
                } else {
                    first as f64 / samples as f64
                };
                (*dimension, share)
            })
            .collect();

        Ok(DistributionReport {
            seed,
            samples,
            unique_types: type_counts.len(),
            type_counts,
            letter_counts,
            first_letter_share,
        })
    }

    pub fn run(&self, samples: usize, seed: u64) -> Result<HarnessReport, ScoringError> {
        Ok(HarnessReport {
            accuracy: self.accuracy(samples, seed)?,
            edge_cases: self.edge_cases(seed),
            distribution: self.random_distribution(samples, seed)?,
        })
    }
}
