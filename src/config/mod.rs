use crate::utils::validation::MAX_FILE_SIZE;
use std::env;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};

/// Image types accepted by the upload endpoint, matched against the sniffed MIME type.
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Upload configuration, built once at startup and shared read-only across requests
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Shared secret callers must present (env: API_KEY, no default)
    pub api_key: Option<String>,

    /// Flat directory uploaded images are written to (default: "imgs")
    pub upload_dir: PathBuf,

    /// URL path prefix the upload directory is published under (default: "/ImgAPI")
    pub public_prefix: String,

    /// URL segment(s) for the upload directory under the prefix (env: PUBLIC_DIR).
    /// When unset it is derived from `upload_dir` without exposing absolute paths.
    pub public_dir: Option<String>,

    /// Maximum body size in bytes, inclusive (default: 5 MB)
    pub max_file_size: usize,

    /// MIME types accepted after content sniffing
    pub allowed_mime_types: Vec<String>,

    /// Permission bits for a freshly created upload directory (default: 0o755)
    pub dir_mode: u32,

    /// Permission bits applied to every stored image (default: 0o644)
    pub file_mode: u32,

    /// Listen address (default: 127.0.0.1:3000)
    pub bind_addr: SocketAddr,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            upload_dir: PathBuf::from("imgs"),
            public_prefix: "/ImgAPI".to_string(),
            public_dir: None,
            max_file_size: MAX_FILE_SIZE,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            dir_mode: 0o755,
            file_mode: 0o644,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup; unparsable values keep their default
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        Self {
            api_key: lookup("API_KEY").filter(|k| !k.is_empty()),

            upload_dir: lookup("UPLOAD_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            public_prefix: lookup("PUBLIC_PREFIX").unwrap_or(default.public_prefix),

            public_dir: lookup("PUBLIC_DIR").and_then(|v| sanitize_url_segments(&v)),

            max_file_size: lookup("MAX_FILE_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            allowed_mime_types: default.allowed_mime_types,

            dir_mode: lookup("UPLOAD_DIR_MODE")
                .and_then(|v| parse_mode(&v))
                .unwrap_or(default.dir_mode),

            file_mode: lookup("UPLOAD_FILE_MODE")
                .and_then(|v| parse_mode(&v))
                .unwrap_or(default.file_mode),

            bind_addr: lookup("BIND_ADDR")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.bind_addr),
        }
    }

    /// Create config for tests and local runs with an explicit key and directory
    pub fn with_key(api_key: impl Into<String>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            upload_dir: upload_dir.into(),
            ..Self::default()
        }
    }

    /// URL path the upload directory is published under, relative to `public_prefix`.
    ///
    /// An explicit `public_dir` wins. A plain relative `upload_dir` maps onto itself
    /// (`./imgs/` -> `imgs`); absolute or `..`-bearing directories only contribute
    /// their final component so the server's filesystem layout never reaches a URL.
    pub fn public_storage_path(&self) -> String {
        if let Some(dir) = &self.public_dir {
            return dir.clone();
        }

        match relative_segments(&self.upload_dir) {
            Some(segments) => segments,
            None => self
                .upload_dir
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// `/`-joined normal components of a relative path, or `None` for absolute paths
/// and paths that climb with `..`
fn relative_segments(path: &Path) -> Option<String> {
    let mut segments = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(segments.join("/"))
}

fn sanitize_url_segments(value: &str) -> Option<String> {
    let segments: Vec<&str> = value.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return None;
    }
    Some(segments.join("/"))
}

/// Parses permission bits written in octal, with or without a `0o` prefix
fn parse_mode(value: &str) -> Option<u32> {
    let digits = value.trim();
    let digits = digits.strip_prefix("0o").unwrap_or(digits);
    u32::from_str_radix(digits, 8).ok().filter(|m| *m <= 0o7777)
}
