//! API error envelope and status-code mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::FulfillmentError;
use crate::store::StoreError;

/// JSON error body: `{"error": "<code>", "message": "<detail>"}`.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                error: code,
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        let code = err.code();
        let message = err.to_string();
        let status = match &err {
            FulfillmentError::InvalidPayload(_) | FulfillmentError::InvalidTemplate(_) => {
                StatusCode::BAD_REQUEST
            }
            FulfillmentError::NotFound(_) => StatusCode::NOT_FOUND,
            FulfillmentError::Store(StoreError::Timeout(_) | StoreError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            FulfillmentError::Store(_) | FulfillmentError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, code, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        FulfillmentError::from(err).into()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
