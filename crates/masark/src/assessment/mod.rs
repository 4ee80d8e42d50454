//! Personality assessment: question catalog, forced-choice scoring, session workflow and
//! response-pattern validation.

pub mod catalog;
pub mod domain;
pub mod harness;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, CatalogImportError, CatalogImporter, QuestionCatalog};
pub use domain::{
    Answer, AnswerOption, AssessmentSession, DeploymentMode, Dimension, Language, Letter,
    PersonalityTypeCode, PreferenceStrength, Question, QuestionId, SessionId, SessionOutcome,
};
pub use harness::{HarnessReport, ValidationHarness};
pub use repository::{RepositoryError, SessionStatusView, SessionStore};
pub use router::assessment_router;
pub use scoring::{
    BorderlinePolicy, ClarityThresholds, DimensionScore, NeutralResponsePolicy, ScoringConfig,
    ScoringEngine, ScoringError, ScoringProfile, ScoringResult, StatisticalReport,
};
pub use service::{AssessmentService, AssessmentServiceError, BatchValidation};
pub use validation::{ValidationReport, ValidationSummary, ValidityLevel};
