pub mod error;
pub mod mentorship;
pub mod moderation;

use axum::http::HeaderMap;

use crate::access::UserId;
use error::WorkflowError;

/// Header carrying the caller's resolved actor id. Token verification happens upstream.
pub const ACTOR_HEADER: &str = "x-actor-id";

pub(crate) fn actor_from_headers(headers: &HeaderMap) -> Result<UserId, WorkflowError> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(UserId::new)
        .ok_or(WorkflowError::Forbidden)
}
