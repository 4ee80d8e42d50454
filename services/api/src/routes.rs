use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use masark::assessment::{assessment_router, AssessmentService, SessionStore};
use masark::careers::{career_router, CareerMatchCache, CareerMatcher};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_service_routes<S, C>(
    assessment: Arc<AssessmentService<S>>,
    careers: Arc<CareerMatcher<C>>,
) -> axum::Router
where
    S: SessionStore + 'static,
    C: CareerMatchCache + 'static,
{
    assessment_router(assessment)
        .merge(career_router(careers))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryCareerCache, InMemorySessionStore};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use masark::assessment::{QuestionCatalog, ScoringConfig};
    use masark::careers::{CareerFit, CareerMatrix};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> axum::Router {
        let assessment = Arc::new(AssessmentService::new(
            Arc::new(InMemorySessionStore::default()),
            Arc::new(QuestionCatalog::standard()),
            ScoringConfig::professional(),
        ));

        let mut matrix = CareerMatrix::new();
        matrix.insert(
            "ESTJ".parse().expect("type"),
            CareerFit {
                career_id: "mgmt-01".to_string(),
                name_en: "Operations Manager".to_string(),
                name_ar: "مدير عمليات".to_string(),
                cluster: "Business".to_string(),
                score: 0.93,
            },
        );
        let careers = Arc::new(CareerMatcher::new(
            Arc::new(matrix),
            Arc::new(InMemoryCareerCache::new(8)),
        ));

        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_service_routes(assessment, careers).layer(Extension(state))
    }

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn health_and_readiness_report_status() {
        let (status, body) = send(
            app(true),
            Request::get("/health").body(Body::empty()).expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(
            app(false),
            Request::get("/ready").body(Body::empty()).expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");
    }

    #[tokio::test]
    async fn raw_score_result_feeds_career_lookup() {
        let request = Request::post("/api/v1/assessment/score")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({ "responses": vec![1; 36] })).expect("json"),
            ))
            .expect("request");
        let (status, body) = send(app(true), request).await;
        assert_eq!(status, StatusCode::OK);
        let type_code = body["type_code"].as_str().expect("type code").to_string();
        assert_eq!(type_code, "ESTJ");

        let (status, body) = send(
            app(true),
            Request::get(format!("/api/v1/careers/{type_code}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["careers"][0]["career_id"], "mgmt-01");
    }
}
