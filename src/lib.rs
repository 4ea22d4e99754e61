pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::UploadConfig;
use crate::services::storage::ImageStore;
use axum::{
    Router,
    http::{HeaderName, HeaderValue},
    middleware::from_fn,
};
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::info;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

#[derive(OpenApi)]
#[openapi(
    paths(api::handlers::upload::upload_image),
    components(
        schemas(
            models::UploadResponse,
            models::Dimensions,
            models::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "images", description = "Raw image upload")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<UploadConfig>,
    pub store: Arc<ImageStore>,
}

impl AppState {
    pub fn new(config: UploadConfig) -> Self {
        let store = ImageStore::from_config(&config);
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
        }
    }
}

/// Headers present on every response, including preflight and errors
const RESPONSE_HEADERS: &[(&str, &str)] = &[
    ("content-type", "application/json"),
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "POST, OPTIONS"),
    ("access-control-allow-headers", "Content-Type, Authorization"),
];

pub fn create_app(state: AppState) -> Router {
    let mut router = Router::new().fallback(api::handlers::upload::upload_image);

    for &(name, value) in RESPONSE_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    // Request ids are assigned outermost so the trace span sees the final id
    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get(&api::middleware::request_id::REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
