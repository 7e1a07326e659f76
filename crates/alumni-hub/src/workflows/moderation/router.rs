use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::domain::{EntityId, EntityKind, ModerationStatus};
use super::projection::QueryFilters;
use super::repository::EntityRepository;
use super::service::ModerationService;
use crate::access::ChapterScope;
use crate::notifications::NotificationSink;
use crate::workflows::actor_from_headers;
use crate::workflows::error::WorkflowError;

#[derive(Debug, Deserialize)]
pub struct SubmitEntityRequest {
    #[serde(default)]
    pub chapter_scope: Option<ChapterScope>,
    pub payload: Value,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub to: ModerationStatus,
}

fn parse_kind(raw: &str) -> Result<EntityKind, WorkflowError> {
    raw.parse()
        .map_err(|_| WorkflowError::NotFound(format!("entity kind '{raw}'")))
}

/// Router builder exposing submission, transition, and query endpoints for every kind.
pub fn moderation_router<R, N>(service: Arc<ModerationService<R, N>>) -> Router
where
    R: EntityRepository + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/moderation/:kind",
            post(submit_handler::<R, N>).get(query_handler::<R, N>),
        )
        .route("/api/v1/moderation/:kind/:id", get(get_handler::<R, N>))
        .route(
            "/api/v1/moderation/:kind/:id/transition",
            post(transition_handler::<R, N>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<Arc<ModerationService<R, N>>>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Json(request): Json<SubmitEntityRequest>,
) -> Result<Response, WorkflowError>
where
    R: EntityRepository + 'static,
    N: NotificationSink + 'static,
{
    let kind = parse_kind(&kind)?;
    let actor_id = actor_from_headers(&headers)?;
    let record = service.submit(kind, &actor_id, request.chapter_scope, request.payload)?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

pub(crate) async fn transition_handler<R, N>(
    State(service): State<Arc<ModerationService<R, N>>>,
    Path((kind, id)): Path<(String, Uuid)>,
    headers: HeaderMap,
    Json(request): Json<TransitionRequest>,
) -> Result<Response, WorkflowError>
where
    R: EntityRepository + 'static,
    N: NotificationSink + 'static,
{
    let kind = parse_kind(&kind)?;
    let actor_id = actor_from_headers(&headers)?;
    let record = service.transition(kind, &EntityId(id), &actor_id, request.to)?;
    Ok((StatusCode::OK, Json(record.status_view())).into_response())
}

pub(crate) async fn get_handler<R, N>(
    State(service): State<Arc<ModerationService<R, N>>>,
    Path((kind, id)): Path<(String, Uuid)>,
    headers: HeaderMap,
) -> Result<Response, WorkflowError>
where
    R: EntityRepository + 'static,
    N: NotificationSink + 'static,
{
    let kind = parse_kind(&kind)?;
    let actor_id = actor_from_headers(&headers)?;
    let record = service.get(kind, &EntityId(id), &actor_id)?;
    Ok(Json(record).into_response())
}

pub(crate) async fn query_handler<R, N>(
    State(service): State<Arc<ModerationService<R, N>>>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Query(filters): Query<QueryFilters>,
) -> Result<Response, WorkflowError>
where
    R: EntityRepository + 'static,
    N: NotificationSink + 'static,
{
    let kind = parse_kind(&kind)?;
    let actor_id = actor_from_headers(&headers)?;
    let records = service.query(kind, &actor_id, &filters)?;
    Ok(Json(records).into_response())
}
