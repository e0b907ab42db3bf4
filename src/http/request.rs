//! Request type handed to route handlers.
//!
//! # Responsibilities
//! - Carry method, URI, headers and the fully buffered body
//! - Stay independent of the socket layer so handlers can be unit tested
//!
//! # Design Decisions
//! - The host buffers the body before dispatch; handlers are synchronous
//! - Built on `axum::http` types, no custom header model

use axum::body::Bytes;

/// A buffered HTTP request as seen by a handler.
pub type Request = axum::http::Request<Bytes>;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Convenience accessors used by handlers and logging.
pub trait RequestExt {
    /// The request ID assigned by the host, if any.
    fn request_id(&self) -> Option<&str>;

    /// Path plus query string, falling back to the bare path.
    fn target(&self) -> &str;
}

impl RequestExt for Request {
    fn request_id(&self) -> Option<&str> {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
    }

    fn target(&self) -> &str {
        self.uri()
            .path_and_query()
            .map_or_else(|| self.uri().path(), |pq| pq.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_keeps_query() {
        let req = axum::http::Request::builder()
            .uri("http://example.com/user/10?verbose=1")
            .header(X_REQUEST_ID, "abc")
            .body(Bytes::new())
            .unwrap();
        assert_eq!(req.target(), "/user/10?verbose=1");
        assert_eq!(req.request_id(), Some("abc"));
    }
}
