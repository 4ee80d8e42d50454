use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::catalog::QuestionCatalog;
use super::domain::{Answer, AssessmentSession, DeploymentMode, Language, SessionId};
use super::repository::{RepositoryError, SessionStore};
use super::scoring::{ScoringConfig, ScoringEngine, ScoringError, ScoringProfile, ScoringResult};
use super::validation::{self, ValidationReport, ValidationSummary};

/// Service composing the catalog, session store and scoring engine.
pub struct AssessmentService<S> {
    store: Arc<S>,
    catalog: Arc<QuestionCatalog>,
    engine: Arc<ScoringEngine>,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("session-{id:06}"))
}

impl<S> AssessmentService<S>
where
    S: SessionStore + 'static,
{
    pub fn new(store: Arc<S>, catalog: Arc<QuestionCatalog>, config: ScoringConfig) -> Self {
        Self {
            store,
            catalog,
            engine: Arc::new(ScoringEngine::new(config)),
        }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Open a new session and persist it.
    pub fn start_session(
        &self,
        language: Language,
        deployment_mode: DeploymentMode,
        started_at: DateTime<Utc>,
    ) -> Result<AssessmentSession, AssessmentServiceError> {
        let session =
            AssessmentSession::new(next_session_id(), language, deployment_mode, started_at);
        let stored = self.store.insert(session)?;
        info!(session_id = %stored.id, ?language, ?deployment_mode, "assessment session started");
        Ok(stored)
    }

    /// Record answers; a repeated question overwrites the earlier answer.
    ///
    /// Every id is checked before anything is stored. The session is marked complete once
    /// each active question has an answer, after which it accepts no further answers.
    pub fn record_answers(
        &self,
        session_id: &SessionId,
        answers: &[Answer],
        answered_at: DateTime<Utc>,
    ) -> Result<AssessmentSession, AssessmentServiceError> {
        let mut session = self
            .store
            .fetch(session_id)?
            .ok_or(RepositoryError::NotFound)?;

        if session.is_completed() {
            warn!(session_id = %session_id, "answers rejected for completed session");
            return Err(AssessmentServiceError::AlreadyCompleted(session.id));
        }

        if let Some(unknown) = answers
            .iter()
            .find(|answer| self.catalog.active(answer.question_id).is_none())
        {
            return Err(ScoringError::UnknownQuestion(unknown.question_id).into());
        }

        for answer in answers {
            session
                .answers
                .insert(answer.question_id, answer.selected_option);
        }

        let complete = self
            .catalog
            .active_questions()
            .all(|question| session.answers.contains_key(&question.id));
        if complete && session.completed_at.is_none() {
            session.completed_at = Some(answered_at);
        }

        self.store.update(session.clone())?;
        Ok(session)
    }

    /// Score the stored answers and write the outcome back in a single step.
    ///
    /// Nothing is written when scoring fails. Recalculating replaces the previous outcome
    /// with an identical one.
    pub fn calculate(
        &self,
        session_id: &SessionId,
        profile: Option<ScoringProfile>,
        computed_at: DateTime<Utc>,
    ) -> Result<ScoringResult, AssessmentServiceError> {
        let session = self
            .store
            .fetch(session_id)?
            .ok_or(RepositoryError::NotFound)?;

        let alternate;
        let engine = match profile {
            Some(profile) if profile != self.engine.config().profile => {
                alternate = self.engine.with_profile(profile);
                &alternate
            }
            _ => self.engine.as_ref(),
        };

        let result = match engine.score_answers(&self.catalog, &session.answer_list()) {
            Ok(result) => result,
            Err(error) => {
                warn!(session_id = %session_id, %error, "assessment calculation rejected");
                return Err(error.into());
            }
        };

        self.store
            .write_outcome(session_id, result.outcome(computed_at))?;
        info!(
            session_id = %session_id,
            type_code = %result.type_code,
            profile = result.profile.label(),
            "assessment outcome stored"
        );

        Ok(result)
    }

    /// Score raw 1-5 responses without touching any session.
    pub fn score_raw(
        &self,
        responses: &[i64],
        profile: Option<ScoringProfile>,
    ) -> Result<ScoringResult, AssessmentServiceError> {
        let result = match profile {
            Some(profile) => self
                .engine
                .with_profile(profile)
                .score_raw_responses(&self.catalog, responses),
            None => self.engine.score_raw_responses(&self.catalog, responses),
        }?;
        Ok(result)
    }

    pub fn session(
        &self,
        session_id: &SessionId,
    ) -> Result<AssessmentSession, AssessmentServiceError> {
        let session = self
            .store
            .fetch(session_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(session)
    }

    pub fn validate_session(
        &self,
        session_id: &SessionId,
    ) -> Result<ValidationReport, AssessmentServiceError> {
        let session = self.session(session_id)?;
        Ok(validation::validate_session(&session, &self.catalog))
    }

    /// Validate many sessions; sessions that cannot be loaded are reported separately.
    pub fn validate_sessions(&self, session_ids: &[SessionId]) -> BatchValidation {
        let loaded: Vec<Result<AssessmentSession, (SessionId, String)>> = session_ids
            .iter()
            .map(|id| match self.session(id) {
                Ok(session) => Ok(session),
                Err(error) => Err((id.clone(), error.to_string())),
            })
            .collect();

        let (sessions, failures): (Vec<_>, Vec<_>) = loaded.into_iter().partition(Result::is_ok);
        let sessions: Vec<AssessmentSession> = sessions.into_iter().flatten().collect();
        let failures: BTreeMap<SessionId, String> = failures
            .into_iter()
            .filter_map(Result::err)
            .collect();

        let reports = validation::validate_batch(&sessions, &self.catalog);
        let summary = ValidationSummary::from_reports(&reports);

        BatchValidation {
            reports,
            failures,
            summary,
        }
    }
}

/// Outcome of validating several sessions.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchValidation {
    pub reports: Vec<ValidationReport>,
    pub failures: BTreeMap<SessionId, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ValidationSummary>,
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("assessment {0} is already completed")]
    AlreadyCompleted(SessionId),
}
