//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use minijinja::context;

use chirp_store::StoreError;

use crate::templates::Templates;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Forbidden - valid session but the resource belongs to someone else.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "You are not allowed to do that.".to_string(),
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let page = Templates::shared()
            .render(
                "error.html",
                context! { status => status.as_u16(), message => message },
            )
            .unwrap_or_else(|_| Html(format!("Error {}", status.as_u16())));

        (status, page).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} not found: {id}")),
            StoreError::UsernameTaken { username } => {
                Self::BadRequest(format!("username already taken: {username}"))
            }
            StoreError::UsernameAlreadySet => Self::BadRequest("username already set".into()),
            StoreError::UsernameRequired => Self::BadRequest("choose a username first".into()),
            StoreError::InvalidKey(key) => Self::Internal(format!("invalid blob key: {key}")),
            StoreError::Database(msg)
            | StoreError::Serialization(msg)
            | StoreError::Blob(msg) => Self::Internal(msg),
        }
    }
}
