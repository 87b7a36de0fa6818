//! Request handling and transformation.
//!
//! # Responsibilities
//! - Attach a request ID (UUID v4) as early as possible
//! - Turn an absolute-form proxy request into an `OutgoingRequest`
//! - Strip hop-by-hop headers in both directions
//!
//! # Design Decisions
//! - Only absolute-form targets are proxied; origin-form requests are not
//!   addressed to a proxy and are rejected
//! - Header order and duplicates are preserved so hooks see the list as sent

use axum::body::Bytes;
use axum::http::header::HeaderName;
use axum::http::{HeaderMap, Uri};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use url::Url;

use crate::host::{HttpHeader, OutgoingRequest};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Hop-by-hop headers never forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "proxy-connection",
    "keep-alive",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "proxy-authorization",
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Remove hop-by-hop headers from a header map in place.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Layers setting and echoing `x-request-id`.
pub fn request_id_layers() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    let header = HeaderName::from_static(X_REQUEST_ID);
    (
        SetRequestIdLayer::new(header.clone(), MakeRequestUuid),
        PropagateRequestIdLayer::new(header),
    )
}

pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Why a request cannot be proxied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    NotAbsolute,
    UnsupportedScheme(String),
    Invalid(String),
}

/// Absolute http(s) target of a proxy request.
pub fn target_url(uri: &Uri) -> Result<Url, TargetError> {
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(TargetError::NotAbsolute);
    }
    let url = Url::parse(&uri.to_string()).map_err(|e| TargetError::Invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(TargetError::UnsupportedScheme(other.to_string())),
    }
}

/// Build the outgoing request forwarded on behalf of the client.
pub fn to_outgoing(
    request_id: String,
    method: axum::http::Method,
    url: Url,
    headers: &HeaderMap,
    body: Bytes,
) -> OutgoingRequest {
    let mut outgoing = OutgoingRequest::new(method, url)
        .with_request_id(request_id)
        .with_body(body);
    outgoing.details.headers = headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name) && name.as_str() != X_REQUEST_ID)
        .map(|(name, value)| HttpHeader::new(name.clone(), value.clone()))
        .collect();
    outgoing
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{ACCEPT_LANGUAGE, CONNECTION};
    use axum::http::{HeaderValue, Method};

    #[test]
    fn test_target_url_requires_absolute_form() {
        let absolute: Uri = "http://example.com/a?b=c".parse().unwrap();
        assert_eq!(target_url(&absolute).unwrap().as_str(), "http://example.com/a?b=c");

        let origin: Uri = "/a".parse().unwrap();
        assert_eq!(target_url(&origin), Err(TargetError::NotAbsolute));

        let ws: Uri = "ws://example.com/".parse().unwrap();
        assert!(matches!(target_url(&ws), Err(TargetError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_outgoing_drops_hop_by_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en"));
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc"));

        let outgoing = to_outgoing(
            "abc".into(),
            Method::GET,
            Url::parse("http://example.com/").unwrap(),
            &headers,
            Bytes::new(),
        );
        assert_eq!(outgoing.details.request_id, "abc");
        assert_eq!(outgoing.details.headers.len(), 1);
        assert!(outgoing.details.headers[0].is("accept-language"));
    }
}
