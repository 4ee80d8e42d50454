use serde::Serialize;

use super::domain::{
    AssessmentSession, DeploymentMode, Language, PersonalityTypeCode, SessionId, SessionOutcome,
};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: AssessmentSession) -> Result<AssessmentSession, RepositoryError>;
    fn update(&self, session: AssessmentSession) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<AssessmentSession>, RepositoryError>;
    /// Replaces the stored outcome in one step; last write wins.
    fn write_outcome(&self, id: &SessionId, outcome: SessionOutcome)
        -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Sanitized representation of a session's progress.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusView {
    pub session_id: SessionId,
    pub status: &'static str,
    pub language: Language,
    pub deployment_mode: DeploymentMode,
    pub answered: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality_type: Option<PersonalityTypeCode>,
}

impl SessionStatusView {
    pub fn from_session(session: &AssessmentSession) -> Self {
        Self {
            session_id: session.id.clone(),
            status: session.status_label(),
            language: session.language,
            deployment_mode: session.deployment_mode,
            answered: session.answers.len(),
            personality_type: session.outcome.as_ref().map(|outcome| outcome.type_code),
        }
    }
}
