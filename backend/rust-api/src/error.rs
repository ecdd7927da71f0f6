//! Error types for the feed adapter and the event service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::models::EventId;
use crate::utils::response::ApiResponse;

/// Failures talking to the third-party event feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("event feed unavailable: {0}")]
    Unavailable(String),

    #[error("event feed returned an undecodable payload: {0}")]
    Decode(String),

    #[error("event {0} is no longer available from the feed")]
    NotFound(EventId),
}

/// Why a single feed record was left out of a listing. Never surfaced to callers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkipReason {
    #[error("record has no uid")]
    MissingUid,

    #[error("record has no start date")]
    MissingStart,

    #[error("invalid start date '{0}'")]
    InvalidStart(String),

    #[error("event started more than 24h ago")]
    Past,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid RSVP status '{0}': must be 'going' or 'interested'")]
    InvalidStatus(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Feed(FeedError::NotFound(_)) | ServiceError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ServiceError::Feed(_) => StatusCode::BAD_GATEWAY,
            ServiceError::InvalidStatus(_) | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Database details stay in the logs.
            ServiceError::Persistence(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            ServiceError::NotFound("Event".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Feed(FeedError::NotFound(Uuid::nil())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Feed(FeedError::Unavailable("timeout".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServiceError::InvalidStatus("maybe".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Persistence(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn invalid_status_message_names_allowed_values() {
        let msg = ServiceError::InvalidStatus("maybe".into()).to_string();
        assert!(msg.contains("'going' or 'interested'"));
    }
}
