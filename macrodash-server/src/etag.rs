//! Content ETags for JSON responses.
//!
//! The tag is the first 16 bytes of the BLAKE3 digest of the serialized
//! body, so identical payloads always get identical tags.

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Strong ETag for `body`, quotes included.
pub fn etag_for(body: &[u8]) -> String {
    let hash = blake3::hash(body);
    let hex = hash.to_hex();
    format!("\"{}\"", &hex.as_str()[..32])
}

/// Whether an `If-None-Match` header value matches `etag`.
pub fn matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}

/// Serialize `value` as JSON with an ETag, or answer 304 when the client
/// already holds this exact body.
pub fn json_with_etag<T: Serialize>(request_headers: &HeaderMap, value: &T) -> Response {
    let body = match serde_json::to_vec(value) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "response serialization failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let etag = etag_for(&body);
    let etag_header = match HeaderValue::from_str(&etag) {
        Ok(v) => v,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let not_modified = request_headers
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| matches(v, &etag));

    let no_cache = HeaderValue::from_static("no-cache");
    if not_modified {
        return (
            StatusCode::NOT_MODIFIED,
            [(ETAG, etag_header), (CACHE_CONTROL, no_cache)],
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (ETAG, etag_header),
            (CACHE_CONTROL, no_cache),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_is_stable_and_quoted() {
        let a = etag_for(b"{\"success\":true}");
        let b = etag_for(b"{\"success\":true}");
        assert_eq!(a, b);
        assert!(a.starts_with('"') && a.ends_with('"'));
        assert_eq!(a.len(), 34);
        assert_ne!(a, etag_for(b"{\"success\":false}"));
    }

    #[test]
    fn if_none_match_forms() {
        let tag = etag_for(b"x");
        assert!(matches(&tag, &tag));
        assert!(matches(&format!("W/{tag}"), &tag));
        assert!(matches(&format!("\"other\", {tag}"), &tag));
        assert!(matches("*", &tag));
        assert!(!matches("\"other\"", &tag));
    }

    #[test]
    fn matching_request_gets_304() {
        let value = serde_json::json!({"success": true});
        let body = serde_json::to_vec(&value).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_str(&etag_for(&body)).unwrap());

        assert_eq!(json_with_etag(&headers, &value).status(), StatusCode::NOT_MODIFIED);
        assert_eq!(json_with_etag(&HeaderMap::new(), &value).status(), StatusCode::OK);
    }
}
