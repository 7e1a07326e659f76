use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::store::RepositoryError;

/// Typed outcome of every moderation and admission operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("actor is not permitted to perform this action")]
    Forbidden,
    #[error("cannot move {kind} from {from} to {to}")]
    IllegalTransition {
        kind: String,
        from: String,
        to: String,
    },
    #[error("no room left in this program")]
    ProgramFull,
    #[error("the application deadline for this program has passed")]
    DeadlinePassed,
    #[error("this program is closed to new participants")]
    ProgramInactive,
    #[error("an open application already exists for this program")]
    DuplicateApplication,
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("lost a concurrent update; retry the operation")]
    Conflict,
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl WorkflowError {
    /// Only transient storage failures and lost races should be retried by callers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WorkflowError::StorageUnavailable(_) | WorkflowError::Conflict
        )
    }

    pub const fn code(&self) -> &'static str {
        match self {
            WorkflowError::NotFound(_) => "not_found",
            WorkflowError::Forbidden => "forbidden",
            WorkflowError::IllegalTransition { .. } => "illegal_transition",
            WorkflowError::ProgramFull => "program_full",
            WorkflowError::DeadlinePassed => "deadline_passed",
            WorkflowError::ProgramInactive => "program_inactive",
            WorkflowError::DuplicateApplication => "duplicate_application",
            WorkflowError::StorageUnavailable(_) => "storage_unavailable",
            WorkflowError::Conflict => "conflict",
            WorkflowError::Invalid(_) => "invalid",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkflowError::Forbidden => StatusCode::FORBIDDEN,
            WorkflowError::IllegalTransition { .. } | WorkflowError::Invalid(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            WorkflowError::ProgramFull
            | WorkflowError::ProgramInactive
            | WorkflowError::DuplicateApplication
            | WorkflowError::Conflict => StatusCode::CONFLICT,
            WorkflowError::DeadlinePassed => StatusCode::GONE,
            WorkflowError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<RepositoryError> for WorkflowError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => WorkflowError::NotFound("record".to_string()),
            RepositoryError::AlreadyExists | RepositoryError::VersionMismatch { .. } => {
                WorkflowError::Conflict
            }
            RepositoryError::Unavailable(reason) => WorkflowError::StorageUnavailable(reason),
        }
    }
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
            "retryable": self.is_retryable(),
        }));
        (self.status_code(), body).into_response()
    }
}
