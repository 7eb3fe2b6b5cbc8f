//! Cheap structural checks run before any network or cryptographic work.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::{AuthError, AuthResult};

/// The only signature algorithm accepted in token headers.
pub const SUPPORTED_ALGORITHM: &str = "RS256";

/// Returns `Ok(true)` when `token` looks like a compact RS256 JWT whose header
/// holds exactly `alg` and `kid`.
///
/// Malformed input yields `Ok(false)`, not an error; only an empty string is
/// reported as [`AuthError::EmptyToken`].
pub fn validate_shape(token: &str) -> AuthResult<bool> {
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }

    let segments: Vec<&str> = token.split('.').collect();
    if !has_compact_shape(&segments) {
        return Ok(false);
    }

    let decoded = match URL_SAFE.decode(pad_segment(segments[0])) {
        Ok(bytes) => bytes,
        Err(_) => return Ok(false),
    };

    let header: Map<String, Value> = match serde_json::from_slice(&decoded) {
        Ok(header) => header,
        Err(_) => return Ok(false),
    };

    Ok(header_is_supported(&header))
}

// header.payload.signature, signature may be empty
fn has_compact_shape(segments: &[&str]) -> bool {
    segments.len() == 3
        && !segments[0].is_empty()
        && !segments[1].is_empty()
        && segments
            .iter()
            .all(|segment| segment.bytes().all(is_base64url_byte))
}

fn is_base64url_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

fn pad_segment(segment: &str) -> String {
    let mut padded = segment.to_string();
    let remainder = padded.len() % 4;
    if remainder != 0 {
        padded.push_str(&"=".repeat(4 - remainder));
    }
    padded
}

fn header_is_supported(header: &Map<String, Value>) -> bool {
    header.len() == 2
        && header.contains_key("kid")
        && header.get("alg").and_then(Value::as_str) == Some(SUPPORTED_ALGORITHM)
}
