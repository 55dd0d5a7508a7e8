//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use image_storage::ImageStorageError;
use schemars::JsonSchema;
use serde::Serialize;

/// API error response body
#[derive(Debug, Serialize, JsonSchema)]
pub struct ApiErrorResponse {
    /// Human-readable error message
    pub error: &'static str,
}

/// Application error carrying the status, an internal code for logs, and the client message
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(status: StatusCode, code: &'static str, message: &'static str) -> Self {
        Self {
            status,
            code,
            message,
        }
    }

    /// Generic failure returned whenever an image could not be stored
    #[must_use]
    pub const fn save_failed(code: &'static str) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            code,
            "Failed to save image.",
        )
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code, only ever logged
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {} - {}", self.code, self.message),
            500..=599 => tracing::error!("Server error: {} - {}", self.code, self.message),
            _ => {}
        }

        (
            self.status,
            Json(ApiErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Convert image storage errors to application errors
///
/// The cause is logged here and never reaches the client.
impl From<ImageStorageError> for AppError {
    fn from(err: ImageStorageError) -> Self {
        let code = match &err {
            ImageStorageError::DynamoDbPutError(_) => "storage_write_failed",
            ImageStorageError::ImageRecordExists | ImageStorageError::ScanRecordExists => {
                "record_exists"
            }
            ImageStorageError::SerializationError(_) => "serialization_failed",
            ImageStorageError::Unavailable(_) => "storage_unavailable",
        };
        tracing::error!("Image storage error: {err}");
        Self::save_failed(code)
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
