//! Common types and utilities for API endpoints.

use std::error::Error;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for API operations.
///
/// Every failure is classified into one of these variants before it
/// reaches a response; raw backend errors never escape to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Required request input is missing or malformed.
    #[error("{0}")]
    Validation(&'static str),

    /// The request conflicts with existing state.
    #[error("{0}")]
    Conflict(&'static str),

    /// Missing or invalid credentials or token.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// The addressed resource does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// An unexpected backend failure.
    ///
    /// Logged server-side with its full cause chain; clients only ever
    /// see the stable public message.
    #[error("{public}")]
    Server {
        /// The message returned to the client.
        public: &'static str,
        /// The underlying failure, kept out of the response.
        #[source]
        cause: Box<dyn Error + Send + Sync>,
    },
}

impl ApiError {
    /// Wraps an unexpected backend failure with a stable public message.
    pub fn server(public: &'static str, cause: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Server {
            public,
            cause: cause.into(),
        }
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// The JSON error body returned by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// The public error message.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Server { .. } => {
                tracing::error!(error = &self as &dyn Error, "error handling request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ApiErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
