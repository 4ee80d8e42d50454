use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::assessment::catalog::QuestionCatalog;
use crate::assessment::domain::{
    Answer, AnswerOption, AssessmentSession, Dimension, Question, QuestionId, SessionId,
    SessionOutcome,
};
use crate::assessment::repository::{RepositoryError, SessionStore};
use crate::assessment::scoring::ScoringConfig;
use crate::assessment::service::AssessmentService;

pub(super) fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn catalog() -> Arc<QuestionCatalog> {
    Arc::new(QuestionCatalog::standard())
}

/// Four questions per dimension, so every dimension can tie.
pub(super) fn even_catalog() -> QuestionCatalog {
    let questions = (0..16u32)
        .map(|position| Question {
            id: QuestionId(position + 1),
            order_number: position as u16 + 1,
            dimension: Dimension::ALL[(position / 4) as usize],
            option_a_maps_to_first: true,
            active: true,
        })
        .collect();
    QuestionCatalog::new(questions).expect("valid catalog")
}

pub(super) fn uniform_answers(catalog: &QuestionCatalog, option: AnswerOption) -> Vec<Answer> {
    catalog
        .active_questions()
        .map(|question| Answer::new(question.id, option))
        .collect()
}

/// Answers whose letters spell the given type on every question.
pub(super) fn answers_for_type(catalog: &QuestionCatalog, code: &str) -> Vec<Answer> {
    let code: crate::assessment::PersonalityTypeCode = code.parse().expect("type code");
    catalog
        .active_questions()
        .map(|question| {
            let wanted = code.letter(question.dimension);
            let option = if question.letter_for(AnswerOption::A) == wanted {
                AnswerOption::A
            } else {
                AnswerOption::B
            };
            Answer::new(question.id, option)
        })
        .collect()
}

pub(super) fn build_service() -> (AssessmentService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let service = AssessmentService::new(store.clone(), catalog(), ScoringConfig::professional());
    (service, store)
}

#[derive(Default)]
pub(super) struct MemoryStore {
    pub(super) sessions: Arc<Mutex<HashMap<SessionId, AssessmentSession>>>,
    pub(super) outcome_writes: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub(super) fn writes(&self) -> usize {
        *self.outcome_writes.lock().expect("store mutex poisoned")
    }
}

impl SessionStore for MemoryStore {
    fn insert(&self, session: AssessmentSession) -> Result<AssessmentSession, RepositoryError> {
        let mut guard = self.sessions.lock().expect("store mutex poisoned");
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: AssessmentSession) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("store mutex poisoned");
        match guard.get_mut(&session.id) {
            Some(existing) => {
                *existing = session;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<AssessmentSession>, RepositoryError> {
        let guard = self.sessions.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn write_outcome(
        &self,
        id: &SessionId,
        outcome: SessionOutcome,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("store mutex poisoned");
        let session = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        session.outcome = Some(outcome);
        *self.outcome_writes.lock().expect("store mutex poisoned") += 1;
        Ok(())
    }
}

pub(super) struct UnavailableStore;

impl SessionStore for UnavailableStore {
    fn insert(&self, _session: AssessmentSession) -> Result<AssessmentSession, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _session: AssessmentSession) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<AssessmentSession>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn write_outcome(
        &self,
        _id: &SessionId,
        _outcome: SessionOutcome,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json")
}
