use crate::models::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Every way an upload request can be rejected. Each variant carries a fixed
/// client-facing message and maps to exactly one status code.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("API Key is required")]
    MissingCredential,

    #[error("API Key is not defined in the server configuration")]
    ServerMisconfigured,

    #[error("Invalid API Key")]
    InvalidCredential,

    #[error("Failed to create upload directory")]
    StorageUnavailable(#[source] std::io::Error),

    #[error("No image data provided")]
    NoData,

    #[error("Failed to read image data")]
    BodyUnreadable,

    #[error("File size exceeds limit")]
    PayloadTooLarge,

    #[error("Invalid image format")]
    UnsupportedFormat,

    #[error("Invalid image data")]
    InvalidImageData,

    #[error("File generation conflict")]
    GenerationConflict,

    #[error("Failed to save the image")]
    WriteFailed(#[source] std::io::Error),
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            UploadError::MissingCredential
            | UploadError::NoData
            | UploadError::BodyUnreadable
            | UploadError::UnsupportedFormat
            | UploadError::InvalidImageData => StatusCode::BAD_REQUEST,
            UploadError::InvalidCredential => StatusCode::FORBIDDEN,
            UploadError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::ServerMisconfigured
            | UploadError::StorageUnavailable(_)
            | UploadError::GenerationConflict
            | UploadError::WriteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            UploadError::StorageUnavailable(e) => {
                tracing::error!("Upload directory unavailable: {:?}", e);
            }
            UploadError::WriteFailed(e) => {
                tracing::error!("Image write failed: {:?}", e);
            }
            _ if status.is_server_error() => {
                tracing::error!("Upload rejected: {}", self);
            }
            _ => {
                tracing::warn!("Upload rejected ({}): {}", status.as_u16(), self);
            }
        }

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}
