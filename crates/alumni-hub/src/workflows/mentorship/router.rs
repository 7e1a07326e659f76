use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use super::domain::{ApplicationId, NewProgram, ProgramId, ProgramUpdate};
use super::repository::AdmissionRepository;
use super::service::AdmissionController;
use crate::notifications::NotificationSink;
use crate::workflows::actor_from_headers;
use crate::workflows::error::WorkflowError;

/// Router builder exposing program management and application lifecycle endpoints.
pub fn mentorship_router<R, N>(controller: Arc<AdmissionController<R, N>>) -> Router
where
    R: AdmissionRepository + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route("/api/v1/programs", post(create_program_handler::<R, N>))
        .route(
            "/api/v1/programs/:program_id",
            get(program_handler::<R, N>).patch(update_program_handler::<R, N>),
        )
        .route(
            "/api/v1/programs/:program_id/applications",
            post(submit_application_handler::<R, N>).get(list_applications_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(application_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/admit",
            post(admit_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            post(reject_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/withdraw",
            post(withdraw_handler::<R, N>),
        )
        .with_state(controller)
}

type Controller<R, N> = State<Arc<AdmissionController<R, N>>>;

pub(crate) async fn create_program_handler<R, N>(
    State(controller): Controller<R, N>,
    headers: HeaderMap,
    Json(request): Json<NewProgram>,
) -> Result<Response, WorkflowError>
where
    R: AdmissionRepository + 'static,
    N: NotificationSink + 'static,
{
    let actor_id = actor_from_headers(&headers)?;
    let program = controller.create_program(&actor_id, request)?;
    let view = program.view(controller.clock().now());
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

pub(crate) async fn program_handler<R, N>(
    State(controller): Controller<R, N>,
    Path(program_id): Path<Uuid>,
) -> Result<Response, WorkflowError>
where
    R: AdmissionRepository + 'static,
    N: NotificationSink + 'static,
{
    let program = controller.program(&ProgramId(program_id))?;
    Ok(Json(program.view(controller.clock().now())).into_response())
}

pub(crate) async fn update_program_handler<R, N>(
    State(controller): Controller<R, N>,
    Path(program_id): Path<Uuid>,
    headers: HeaderMap,
    Json(update): Json<ProgramUpdate>,
) -> Result<Response, WorkflowError>
where
    R: AdmissionRepository + 'static,
    N: NotificationSink + 'static,
{
    let actor_id = actor_from_headers(&headers)?;
    let program = controller.update_program(&ProgramId(program_id), &actor_id, update)?;
    Ok(Json(program.view(controller.clock().now())).into_response())
}

pub(crate) async fn submit_application_handler<R, N>(
    State(controller): Controller<R, N>,
    Path(program_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, WorkflowError>
where
    R: AdmissionRepository + 'static,
    N: NotificationSink + 'static,
{
    let applicant_id = actor_from_headers(&headers)?;
    let application = controller.submit_application(&ProgramId(program_id), &applicant_id)?;
    Ok((StatusCode::CREATED, Json(application)).into_response())
}

pub(crate) async fn list_applications_handler<R, N>(
    State(controller): Controller<R, N>,
    Path(program_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, WorkflowError>
where
    R: AdmissionRepository + 'static,
    N: NotificationSink + 'static,
{
    let actor_id = actor_from_headers(&headers)?;
    let applications = controller.applications(&ProgramId(program_id), &actor_id)?;
    Ok(Json(applications).into_response())
}

pub(crate) async fn application_handler<R, N>(
    State(controller): Controller<R, N>,
    Path(application_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, WorkflowError>
where
    R: AdmissionRepository + 'static,
    N: NotificationSink + 'static,
{
    let actor_id = actor_from_headers(&headers)?;
    let application = controller.application(&ApplicationId(application_id), &actor_id)?;
    Ok(Json(application).into_response())
}

pub(crate) async fn admit_handler<R, N>(
    State(controller): Controller<R, N>,
    Path(application_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, WorkflowError>
where
    R: AdmissionRepository + 'static,
    N: NotificationSink + 'static,
{
    let actor_id = actor_from_headers(&headers)?;
    let application = controller.admit(&ApplicationId(application_id), &actor_id)?;
    Ok(Json(application).into_response())
}

pub(crate) async fn reject_handler<R, N>(
    State(controller): Controller<R, N>,
    Path(application_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, WorkflowError>
where
    R: AdmissionRepository + 'static,
    N: NotificationSink + 'static,
{
    let actor_id = actor_from_headers(&headers)?;
    let application = controller.reject(&ApplicationId(application_id), &actor_id)?;
    Ok(Json(application).into_response())
}

pub(crate) async fn withdraw_handler<R, N>(
    State(controller): Controller<R, N>,
    Path(application_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, WorkflowError>
where
    R: AdmissionRepository + 'static,
    N: NotificationSink + 'static,
{
    let actor_id = actor_from_headers(&headers)?;
    let application = controller.withdraw(&ApplicationId(application_id), &actor_id)?;
    Ok(Json(application).into_response())
}
