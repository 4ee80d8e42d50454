use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::{CareerMatchCache, CareerMatchError, CareerMatcher, DEFAULT_MATCH_LIMIT};
use crate::assessment::PersonalityTypeCode;

/// Router exposing career recommendations for a personality type.
pub fn career_router<C>(matcher: Arc<CareerMatcher<C>>) -> Router
where
    C: CareerMatchCache + 'static,
{
    Router::new()
        .route("/api/v1/careers/:type_code", get(matches_handler::<C>))
        .with_state(matcher)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LimitQuery {
    pub limit: Option<usize>,
}

fn error_response(error: CareerMatchError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

pub(crate) async fn matches_handler<C>(
    State(matcher): State<Arc<CareerMatcher<C>>>,
    Path(type_code): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Response
where
    C: CareerMatchCache + 'static,
{
    let code = match type_code.to_ascii_uppercase().parse::<PersonalityTypeCode>() {
        Ok(code) => code,
        Err(_) => return error_response(CareerMatchError::InvalidType(type_code)),
    };
    let limit = query.limit.unwrap_or(DEFAULT_MATCH_LIMIT);

    match matcher.top_matches(code, limit) {
        Ok(matches) => {
            let payload = json!({
                "personality_type": code,
                "count": matches.len(),
                "careers": matches,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}
