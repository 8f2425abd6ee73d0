//! Mapping of catalog errors onto the response envelope.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::api_types::{ApiEnvelope, CODE_INVALID_REQUEST, CODE_SYSTEM_ERROR, CODE_USER_ERROR};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body missing, not JSON, or the wrong shape.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Well-formed request the catalog refused.
    #[error("{0}")]
    User(String),
    #[error(transparent)]
    System(mediacat_core::Error),
}

impl From<mediacat_core::Error> for ApiError {
    fn from(err: mediacat_core::Error) -> Self {
        if err.is_client_error() {
            ApiError::User(err.to_string())
        } else {
            ApiError::System(err)
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn code(&self) -> i32 {
        match self {
            ApiError::InvalidRequest(_) => CODE_INVALID_REQUEST,
            ApiError::User(_) => CODE_USER_ERROR,
            ApiError::System(_) => CODE_SYSTEM_ERROR,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::User(_) => StatusCode::BAD_REQUEST,
            ApiError::System(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let errmsg = match self {
            ApiError::System(err) => {
                // Storage detail stays in the log, never in the body
                error!(
                    subsystem = "api",
                    component = "error",
                    error = %err,
                    "Request failed"
                );
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiEnvelope::failure(code, errmsg))).into_response()
    }
}
