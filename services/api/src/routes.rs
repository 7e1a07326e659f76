use crate::infra::AppState;
use alumni_hub::notifications::{NotificationIntent, NotificationSink};
use alumni_hub::workflows::mentorship::{mentorship_router, AdmissionController, AdmissionRepository};
use alumni_hub::workflows::moderation::{moderation_router, EntityRepository, ModerationService};
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OutboxQuery {
    /// Leave intents buffered instead of draining them.
    #[serde(default)]
    pub(crate) peek: bool,
}

pub(crate) fn with_service_routes<E, A, N>(
    moderation: Arc<ModerationService<E, N>>,
    admissions: Arc<AdmissionController<A, N>>,
) -> axum::Router
where
    E: EntityRepository + 'static,
    A: AdmissionRepository + 'static,
    N: NotificationSink + 'static,
{
    moderation_router(moderation)
        .merge(mentorship_router(admissions))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/notifications",
            axum::routing::get(notifications_endpoint),
        )
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

/// Intents in commit order, for the external delivery worker to poll.
pub(crate) async fn notifications_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<OutboxQuery>,
) -> Json<Vec<NotificationIntent>> {
    let intents = if query.peek {
        state.outbox.pending()
    } else {
        state.outbox.drain()
    };
    Json(intents)
}
