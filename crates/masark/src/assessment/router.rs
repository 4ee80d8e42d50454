use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::domain::{Answer, AnswerOption, DeploymentMode, Language, QuestionId, SessionId};
use super::repository::{RepositoryError, SessionStatusView, SessionStore};
use super::scoring::raw::parse_response_values;
use super::scoring::{ScoringError, ScoringProfile};
use super::service::{AssessmentService, AssessmentServiceError};

/// Router builder exposing HTTP endpoints for sessions, scoring and validation.
pub fn assessment_router<S>(service: Arc<AssessmentService<S>>) -> Router
where
    S: SessionStore + 'static,
{
    Router::new()
        .route("/api/v1/assessment/sessions", post(start_handler::<S>))
        .route("/api/v1/assessment/questions", get(questions_handler::<S>))
        .route(
            "/api/v1/assessment/sessions/:session_id/answers",
            post(answers_handler::<S>),
        )
        .route(
            "/api/v1/assessment/sessions/:session_id/results",
            post(calculate_handler::<S>).get(results_handler::<S>),
        )
        .route(
            "/api/v1/assessment/sessions/:session_id/validation",
            get(validation_handler::<S>),
        )
        .route("/api/v1/assessment/score", post(score_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StartSessionRequest {
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub deployment_mode: DeploymentMode,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct AnswerPayload {
    pub question_id: u32,
    pub selected_option: AnswerOption,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct RecordAnswersRequest {
    pub answers: Vec<AnswerPayload>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProfileQuery {
    pub profile: Option<ScoringProfile>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct RawScoreRequest {
    pub responses: Vec<Value>,
    #[serde(default)]
    pub profile: Option<ScoringProfile>,
}

pub(crate) fn error_response(error: AssessmentServiceError) -> Response {
    let status = match &error {
        AssessmentServiceError::Scoring(
            ScoringError::IncompleteAssessment { .. } | ScoringError::InvalidResponseValue { .. },
        ) => StatusCode::UNPROCESSABLE_ENTITY,
        AssessmentServiceError::Scoring(
            ScoringError::UnknownQuestion(_) | ScoringError::DuplicateAnswer(_),
        ) => StatusCode::BAD_REQUEST,
        AssessmentServiceError::Scoring(ScoringError::CatalogMismatch { .. }) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AssessmentServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AssessmentServiceError::Repository(RepositoryError::Conflict)
        | AssessmentServiceError::AlreadyCompleted(_) => StatusCode::CONFLICT,
        AssessmentServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn start_handler<S>(
    State(service): State<Arc<AssessmentService<S>>>,
    axum::Json(request): axum::Json<StartSessionRequest>,
) -> Response
where
    S: SessionStore + 'static,
{
    match service.start_session(request.language, request.deployment_mode, Utc::now()) {
        Ok(session) => {
            let view = SessionStatusView::from_session(&session);
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn questions_handler<S>(
    State(service): State<Arc<AssessmentService<S>>>,
) -> Response
where
    S: SessionStore + 'static,
{
    let questions: Vec<Value> = service
        .catalog()
        .active_questions()
        .map(|question| {
            json!({
                "id": question.id.0,
                "order_number": question.order_number,
                "dimension": question.dimension,
            })
        })
        .collect();

    let payload = json!({
        "count": questions.len(),
        "questions": questions,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn answers_handler<S>(
    State(service): State<Arc<AssessmentService<S>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<RecordAnswersRequest>,
) -> Response
where
    S: SessionStore + 'static,
{
    let answers: Vec<Answer> = request
        .answers
        .iter()
        .map(|answer| Answer::new(QuestionId(answer.question_id), answer.selected_option))
        .collect();

    match service.record_answers(&SessionId(session_id), &answers, Utc::now()) {
        Ok(session) => {
            let view = SessionStatusView::from_session(&session);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn calculate_handler<S>(
    State(service): State<Arc<AssessmentService<S>>>,
    Path(session_id): Path<String>,
    Query(query): Query<ProfileQuery>,
) -> Response
where
    S: SessionStore + 'static,
{
    match service.calculate(&SessionId(session_id), query.profile, Utc::now()) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn results_handler<S>(
    State(service): State<Arc<AssessmentService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
{
    let id = SessionId(session_id);
    match service.session(&id) {
        Ok(session) => match session.outcome {
            Some(outcome) => {
                let payload = json!({
                    "session_id": id,
                    "personality_type": outcome.type_code,
                    "strengths": outcome.strengths,
                    "clarity": outcome.clarity,
                    "computed_at": outcome.computed_at,
                });
                (StatusCode::OK, axum::Json(payload)).into_response()
            }
            None => {
                let payload = json!({
                    "error": "results have not been calculated for this session",
                    "session_id": id,
                });
                (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
            }
        },
        Err(error) => error_response(error),
    }
}

pub(crate) async fn validation_handler<S>(
    State(service): State<Arc<AssessmentService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
{
    match service.validate_session(&SessionId(session_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_handler<S>(
    State(service): State<Arc<AssessmentService<S>>>,
    axum::Json(request): axum::Json<RawScoreRequest>,
) -> Response
where
    S: SessionStore + 'static,
{
    let responses = match parse_response_values(&request.responses) {
        Ok(responses) => responses,
        Err(error) => return error_response(error.into()),
    };

    match service.score_raw(&responses, request.profile) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}
