mod parser;

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use super::domain::{Dimension, Question, QuestionId};

/// Number of questions in the standard instrument.
pub const STANDARD_QUESTION_COUNT: usize = 36;

/// Ordered question catalog keyed by question id.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
    index: HashMap<QuestionId, usize>,
}

impl QuestionCatalog {
    pub fn new(mut questions: Vec<Question>) -> Result<Self, CatalogError> {
        questions.sort_by_key(|question| (question.order_number, question.id));

        let mut index = HashMap::with_capacity(questions.len());
        for (position, question) in questions.iter().enumerate() {
            if index.insert(question.id, position).is_some() {
                return Err(CatalogError::DuplicateQuestion(question.id));
            }
        }

        Ok(Self { questions, index })
    }

    /// The 36-question instrument: blocks of three questions cycling EI, SN, TF, JP.
    pub fn standard() -> Self {
        let questions = (0..STANDARD_QUESTION_COUNT)
            .map(|position| {
                let dimension = Dimension::ALL[(position / 3) % Dimension::ALL.len()];
                let number = position as u32 + 1;
                Question {
                    id: QuestionId(number),
                    order_number: number as u16,
                    dimension,
                    option_a_maps_to_first: true,
                    active: true,
                }
            })
            .collect::<Vec<_>>();

        let index = questions
            .iter()
            .enumerate()
            .map(|(position, question)| (question.id, position))
            .collect();

        Self { questions, index }
    }

    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.index.get(&id).map(|position| &self.questions[*position])
    }

    /// Looks up a question that can currently be answered.
    pub fn active(&self, id: QuestionId) -> Option<&Question> {
        self.get(id).filter(|question| question.active)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Active questions in presentation order.
    pub fn active_questions(&self) -> impl Iterator<Item = &Question> + '_ {
        self.questions.iter().filter(|question| question.active)
    }

    pub fn active_count(&self) -> usize {
        self.active_questions().count()
    }

    pub fn active_count_for(&self, dimension: Dimension) -> usize {
        self.active_questions()
            .filter(|question| question.dimension == dimension)
            .count()
    }
}

impl Default for QuestionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("question {0} appears more than once in the catalog")]
    DuplicateQuestion(QuestionId),
}

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    UnknownDimension { line: u64, value: String },
    Catalog(CatalogError),
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read question catalog: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid question catalog CSV: {}", err),
            CatalogImportError::UnknownDimension { line, value } => {
                write!(f, "line {line}: unknown dimension '{value}'")
            }
            CatalogImportError::Catalog(err) => write!(f, "invalid question catalog: {}", err),
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::UnknownDimension { .. } => None,
            CatalogImportError::Catalog(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<CatalogError> for CatalogImportError {
    fn from(err: CatalogError) -> Self {
        Self::Catalog(err)
    }
}

/// Loads a question catalog from CSV (`id,order_number,dimension,option_a_maps_to_first,active`).
pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<QuestionCatalog, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<QuestionCatalog, CatalogImportError> {
        let mut questions = Vec::new();

        for record in parser::parse_records(reader)? {
            let dimension = record.dimension.parse::<Dimension>().map_err(|_| {
                CatalogImportError::UnknownDimension {
                    line: record.line,
                    value: record.dimension.clone(),
                }
            })?;

            questions.push(Question {
                id: QuestionId(record.id),
                order_number: record.order_number,
                dimension,
                option_a_maps_to_first: record.option_a_maps_to_first,
                active: record.active,
            });
        }

        Ok(QuestionCatalog::new(questions)?)
    }
}
