//! # Web API Error Types
//!
//! Errors surfaced to API callers and their HTTP conversions. The wire
//! contract is `{"error": message}`; only the error's own message text
//! ever reaches the caller, full detail stays in the server log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::error::RegistrationError;
use crate::models::SubmissionError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The submission failed validation; no external call was made.
    #[error("{0}")]
    Validation(String),

    /// An external step of the checkout or catalog flow failed.
    #[error("{0}")]
    Checkout(String),
}

impl ApiError {
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout(message.into())
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        Self::Checkout(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        warn!(error = %message, "request rejected");
        (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for web API operations.
pub type ApiResult<T> = Result<T, ApiError>;
