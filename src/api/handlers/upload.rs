use crate::AppState;
use crate::api::error::UploadError;
use crate::config::UploadConfig;
use crate::models::UploadResponse;
use crate::utils::auth::{extract_credential, verify_api_key};
use crate::utils::validation::{extension_for_mime, validate_image};
use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};

#[utoipa::path(
    post,
    path = "/",
    request_body(content = Vec<u8>, description = "Raw image bytes (JPEG, PNG, GIF or WEBP)", content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing key, empty body, unsupported format or invalid image", body = ErrorResponse),
        (status = 403, description = "Invalid API key", body = ErrorResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse),
        (status = 413, description = "Image exceeds the size limit", body = ErrorResponse),
        (status = 500, description = "Server misconfigured or storage failure", body = ErrorResponse)
    ),
    security(
        ("api_key" = [])
    ),
    tag = "images"
)]
pub async fn upload_image(State(state): State<AppState>, req: Request) -> Response {
    // Preflight
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    match handle_upload(&state, req).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn handle_upload(state: &AppState, req: Request) -> Result<UploadResponse, UploadError> {
    let (parts, body) = req.into_parts();

    if parts.method != Method::POST {
        return Err(UploadError::MethodNotAllowed);
    }

    authorize(&parts.headers, &state.config)?;

    state.store.ensure_dir().await?;

    let data = read_body(body, state.config.max_file_size).await?;

    let (mime, dimensions) = validate_image(
        &data,
        state.config.max_file_size,
        &state.config.allowed_mime_types,
    )?;
    let extension = extension_for_mime(mime);

    let stored = state.store.store(data, extension).await?;

    let url = public_url(&parts.headers, &parts.uri, &state.config, &stored.filename);

    tracing::info!(
        "🖼️  Stored {} ({} bytes, {}, {}x{})",
        stored.path.display(),
        stored.size,
        mime,
        dimensions.width,
        dimensions.height
    );

    Ok(UploadResponse::success(
        url,
        stored.filename,
        stored.size,
        mime,
        dimensions,
    ))
}

/// Checks the presented key against the configured one
fn authorize(headers: &HeaderMap, config: &UploadConfig) -> Result<(), UploadError> {
    let provided = extract_credential(headers).ok_or(UploadError::MissingCredential)?;
    let expected = config
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or(UploadError::ServerMisconfigured)?;

    if !verify_api_key(&provided, expected) {
        return Err(UploadError::InvalidCredential);
    }
    Ok(())
}

/// Buffers the body, giving up as soon as it grows past `max_size` so oversized
/// uploads are rejected without holding the whole payload.
async fn read_body(body: Body, max_size: usize) -> Result<Bytes, UploadError> {
    let data = Limited::new(body, max_size)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                UploadError::PayloadTooLarge
            } else {
                tracing::warn!("Failed to read request body: {}", e);
                UploadError::BodyUnreadable
            }
        })?
        .to_bytes();

    if data.is_empty() {
        return Err(UploadError::NoData);
    }
    Ok(data)
}

fn request_scheme(headers: &HeaderMap, uri: &Uri) -> &'static str {
    let forwarded_https = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().eq_ignore_ascii_case("https"))
        .unwrap_or(false);

    if forwarded_https || uri.scheme_str() == Some("https") {
        "https"
    } else {
        "http"
    }
}

fn request_host(headers: &HeaderMap, uri: &Uri) -> String {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .unwrap_or_else(|| "localhost".to_string())
}

/// `<scheme>://<host><prefix>/<public dir>/<filename>`
pub fn public_url(headers: &HeaderMap, uri: &Uri, config: &UploadConfig, filename: &str) -> String {
    let mut path = config.public_prefix.trim_end_matches('/').to_string();
    let relative = config.public_storage_path();
    if !relative.is_empty() {
        path.push('/');
        path.push_str(&relative);
    }

    format!(
        "{}://{}{}/{}",
        request_scheme(headers, uri),
        request_host(headers, uri),
        path,
        filename
    )
}
