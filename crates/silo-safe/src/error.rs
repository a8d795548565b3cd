//! HTTP error types for the Safe server.
//!
//! Maps domain errors from `silo-core` into HTTP responses. Authorization
//! and malformed-input rejections answer with an *empty* body — the caller
//! learns the status class and nothing else. Infrastructure failures
//! return a generic JSON body while the detail goes to the process log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use silo_core::error::StoreError;
use silo_core::gateway::{Denied, NotReady};

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// The root key is not set — the store refuses all secret operations.
    NotReady,
    /// The peer identity did not satisfy the required role.
    Unauthorized,
    /// The request was malformed (unreadable body, wrong shape, empty
    /// required field).
    BadRequest,
    /// Requested resource not found.
    NotFound(String),
    /// Internal server error; detail is logged, never echoed.
    Internal(String),
}

/// JSON error body used for the non-minimal responses.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Information-lean rejections: status only, empty body.
            Self::NotReady => StatusCode::SERVICE_UNAVAILABLE.into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::BadRequest => StatusCode::BAD_REQUEST.into_response(),

            Self::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                axum::Json(ErrorBody {
                    error: "not_found",
                    message: msg,
                }),
            )
                .into_response(),

            Self::Internal(msg) => {
                error!(detail = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(ErrorBody {
                        error: "internal_error",
                        message: "internal error".to_owned(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RootKeyNotSet => Self::NotReady,
            StoreError::NotFound { name } => Self::NotFound(format!("secret not found: {name}")),
            StoreError::Render(_) => Self::BadRequest,
        }
    }
}

impl From<NotReady> for AppError {
    fn from(_: NotReady) -> Self {
        Self::NotReady
    }
}

impl From<Denied> for AppError {
    fn from(_: Denied) -> Self {
        Self::Unauthorized
    }
}
