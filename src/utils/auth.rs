use axum::http::{HeaderMap, header::AUTHORIZATION};

const BEARER_PREFIX: &str = "Bearer ";

/// Pulls the caller's API key out of the Authorization header, stripping an
/// optional `Bearer ` scheme. Empty values count as absent.
pub fn extract_credential(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let credential = raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw);

    if credential.is_empty() {
        None
    } else {
        Some(credential.to_string())
    }
}

/// Checks a presented key against the configured one without short-circuiting
/// on the first differing byte.
pub fn verify_api_key(provided: &str, expected: &str) -> bool {
    constant_time_eq(provided.as_bytes(), expected.as_bytes())
}

/// Constant-time byte comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
