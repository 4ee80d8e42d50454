use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::super::catalog::QuestionCatalog;
use super::super::domain::{Answer, AnswerOption, Dimension, Letter, Question};
use super::ScoringError;

/// Answer counts for both poles of one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionCount {
    pub dimension: Dimension,
    pub first: u32,
    pub second: u32,
}

impl DimensionCount {
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            first: 0,
            second: 0,
        }
    }

    pub fn total(&self) -> u32 {
        self.first + self.second
    }

    pub fn is_tied(&self) -> bool {
        self.first == self.second
    }

    pub fn count_for(&self, letter: Letter) -> u32 {
        if letter == self.dimension.first() {
            self.first
        } else {
            self.second
        }
    }

    pub fn share_first(&self) -> f64 {
        share(self.first, self.total())
    }

    pub fn share_second(&self) -> f64 {
        share(self.second, self.total())
    }
}

fn share(count: u32, total: u32) -> f64 {
    if total == 0 {
        0.5
    } else {
        f64::from(count) / f64::from(total)
    }
}

/// Per-dimension answer counts in EI, SN, TF, JP order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionTally {
    counts: [DimensionCount; 4],
}

impl DimensionTally {
    pub fn empty() -> Self {
        Self {
            counts: Dimension::ALL.map(DimensionCount::new),
        }
    }

    pub fn get(&self, dimension: Dimension) -> DimensionCount {
        self.counts[dimension.index()]
    }

    pub fn counts(&self) -> &[DimensionCount; 4] {
        &self.counts
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(DimensionCount::total).sum()
    }

    fn record(&mut self, question: &Question, option: AnswerOption) {
        let count = &mut self.counts[question.dimension.index()];
        if question.maps_to_first(option) {
            count.first += 1;
        } else {
            count.second += 1;
        }
    }
}

/// Validated answers joined with their questions, in catalog order.
#[derive(Debug)]
pub(crate) struct TalliedAnswers<'a> {
    pub(crate) tally: DimensionTally,
    pub(crate) responses: Vec<(&'a Question, AnswerOption)>,
}

/// Checks the catalog can be scored with `expected` questions.
pub(crate) fn check_catalog(catalog: &QuestionCatalog, expected: usize) -> Result<(), ScoringError> {
    let active = catalog.active_count();
    if active != expected {
        return Err(ScoringError::CatalogMismatch {
            detail: format!("catalog has {active} active questions but {expected} are expected"),
        });
    }

    if let Some(dimension) = Dimension::ALL
        .into_iter()
        .find(|dimension| catalog.active_count_for(*dimension) == 0)
    {
        return Err(ScoringError::CatalogMismatch {
            detail: format!("dimension {dimension} has no active questions"),
        });
    }

    Ok(())
}

pub(crate) fn tally_answers<'a>(
    catalog: &'a QuestionCatalog,
    answers: &[Answer],
    expected: usize,
) -> Result<TalliedAnswers<'a>, ScoringError> {
    check_catalog(catalog, expected)?;

    let mut seen = HashSet::with_capacity(answers.len());
    let mut responses = Vec::with_capacity(answers.len());

    for answer in answers {
        let question = catalog
            .active(answer.question_id)
            .ok_or(ScoringError::UnknownQuestion(answer.question_id))?;

        if !seen.insert(answer.question_id) {
            return Err(ScoringError::DuplicateAnswer(answer.question_id));
        }

        responses.push((question, answer.selected_option));
    }

    if responses.len() != expected {
        return Err(ScoringError::IncompleteAssessment {
            expected,
            found: responses.len(),
        });
    }

    responses.sort_by_key(|(question, _)| (question.order_number, question.id));

    let mut tally = DimensionTally::empty();
    for (question, option) in &responses {
        tally.record(question, *option);
    }

    Ok(TalliedAnswers { tally, responses })
}
