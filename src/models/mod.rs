use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Body returned for a stored image
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub status: String,
    pub message: String,
    pub url: String,
    pub filename: String,
    pub size: usize,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub dimensions: Dimensions,
}

impl UploadResponse {
    pub fn success(
        url: String,
        filename: String,
        size: usize,
        mime_type: &str,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            status: "success".to_string(),
            message: "Image uploaded successfully".to_string(),
            url,
            filename,
            size,
            mime_type: mime_type.to_string(),
            dimensions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}
