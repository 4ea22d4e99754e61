#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use http_body_util::BodyExt;
use image::{ImageOutputFormat, RgbImage};
use img_api::config::UploadConfig;
use img_api::{AppState, create_app};
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

pub const API_KEY: &str = "secret123";

pub struct TestApp {
    pub app: Router,
    pub upload_dir: std::path::PathBuf,
    _tmp: TempDir,
}

pub fn setup() -> TestApp {
    setup_with(|_| {})
}

pub fn setup_with<F: FnOnce(&mut UploadConfig)>(customize: F) -> TestApp {
    let tmp = tempfile::tempdir().unwrap();
    let upload_dir = tmp.path().join("imgs");
    let mut config = UploadConfig::with_key(API_KEY, &upload_dir);
    customize(&mut config);

    TestApp {
        app: create_app(AppState::new(config)),
        upload_dir,
        _tmp: tmp,
    }
}

pub fn encode(width: u32, height: u32, format: ImageOutputFormat) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageOutputFormat::Png)
}

/// 1x1 lossless (VP8L) WEBP with an alpha channel
pub const WEBP_1X1: &[u8] = &[
    0x52, 0x49, 0x46, 0x46, 0x1A, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50, 0x56, 0x50, 0x38,
    0x4C, 0x0D, 0x00, 0x00, 0x00, 0x2F, 0x00, 0x00, 0x00, 0x10, 0x07, 0x10, 0x11, 0x11, 0x88,
    0x88, 0xFE, 0x07, 0x00,
];

pub fn upload_request(auth: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/ImgAPI/img_uploader.php")
        .header("Host", "example.com");
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub fn stored_files(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect(),
        Err(_) => Vec::new(),
    }
}
