//! HTTP error handling
//!
//! Every failure leaves the server as `{"error": "...", "code": "..."}` with
//! a status derived from the code. Downstream failures are logged here and
//! replaced by a generic message so internal detail never reaches clients.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use studyforge_core::ServiceError;

use crate::clients::ClientError;

pub const INVALID_INPUT: &str = "INVALID_INPUT";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const CONFLICT: &str = "CONFLICT";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

const GENERIC_MESSAGE: &str = "Internal server error";

/// JSON error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub error: String,
    /// Machine-readable error code
    pub code: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(message, INVALID_INPUT)
    }

    /// Log `err` and return the generic 500 body
    pub fn internal(context: &str, err: &dyn std::error::Error) -> Self {
        tracing::error!(error = %err, "{}", context);
        Self::new(GENERIC_MESSAGE, INTERNAL_ERROR)
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            INVALID_INPUT => StatusCode::BAD_REQUEST,
            NOT_FOUND => StatusCode::NOT_FOUND,
            CONFLICT => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(e) => HttpError::invalid_input(e.to_string()),
            ServiceError::NotFound { .. } => HttpError::new(err.to_string(), NOT_FOUND),
            ServiceError::Conflict { .. } => HttpError::new(err.to_string(), CONFLICT),
            ServiceError::Database(ref e) => HttpError::internal("database operation failed", e),
        }
    }
}

impl From<ClientError> for HttpError {
    fn from(err: ClientError) -> Self {
        HttpError::internal("external service call failed", &err)
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::invalid_input(rejection.body_text())
    }
}

impl From<QueryRejection> for HttpError {
    fn from(rejection: QueryRejection) -> Self {
        HttpError::invalid_input(rejection.body_text())
    }
}
