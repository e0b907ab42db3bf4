//! Handlers shipped with the binary.
//!
//! Configuration routes name one of these. Embedders build their own
//! [`HandlerRegistry`] instead.

use std::fmt::Write as _;

use axum::http::{header, HeaderValue, StatusCode};
use serde_json::json;

use crate::handler::{HandlerRegistry, Valid, Validate};
use crate::http::{Request, RequestExt, ResponseWriter};

/// A three digit numeric code, e.g. an HTTP status.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusCodeParam {
    pub code: u16,
}

impl Validate for StatusCodeParam {
    fn validate(&mut self, raw: &str) -> bool {
        if raw.len() != 3 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        match raw.parse() {
            Ok(code) => {
                self.code = code;
                true
            }
            Err(_) => false,
        }
    }
}

pub fn hello(w: &mut ResponseWriter, _req: &Request) {
    w.write("hello, world\n");
}

pub fn health(w: &mut ResponseWriter, _req: &Request) {
    w.insert_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    w.write(json!({ "status": "ok" }).to_string());
}

pub fn user(w: &mut ResponseWriter, _req: &Request, id: i64) {
    let _ = writeln!(w, "user {id}");
}

pub fn user_asset(w: &mut ResponseWriter, _req: &Request, id: i64, name: String) {
    let _ = writeln!(w, "user {id} asset {name}");
}

pub fn files(w: &mut ResponseWriter, _req: &Request, path: String) {
    let _ = writeln!(w, "file {path}");
}

/// Respond with the requested status code.
pub fn status(w: &mut ResponseWriter, _req: &Request, code: Valid<StatusCodeParam>) {
    match StatusCode::from_u16(code.code) {
        Ok(status) => {
            w.set_status(status);
            let _ = writeln!(w, "{status}");
        }
        Err(_) => {
            w.set_status(StatusCode::BAD_REQUEST);
            let _ = writeln!(w, "unsupported status {}", code.code);
        }
    }
}

/// Echo the request line, request ID and body back as JSON.
pub fn echo(w: &mut ResponseWriter, req: &Request) {
    w.insert_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let body = json!({
        "method": req.method().as_str(),
        "target": req.target(),
        "request_id": req.request_id(),
        "body": String::from_utf8_lossy(req.body()),
    });
    w.write(body.to_string());
}

pub fn not_found_json(w: &mut ResponseWriter, req: &Request) {
    w.set_status(StatusCode::NOT_FOUND);
    w.insert_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    w.write(json!({ "error": "not found", "path": req.uri().path() }).to_string());
}

/// Registry with every built-in handler under its config name.
pub fn registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register("hello", hello)
        .register("health", health)
        .register("user", user)
        .register("user_asset", user_asset)
        .register("files", files)
        .register("status", status)
        .register("echo", echo)
        .register("not_found_json", not_found_json);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ParamKind;

    #[test]
    fn test_registry_shapes() {
        let registry = registry();
        assert_eq!(registry.len(), 8);
        assert_eq!(
            registry.resolve("user_asset").param_kinds(),
            &[ParamKind::Integer, ParamKind::String]
        );
        assert_eq!(registry.resolve("status").param_kinds(), &[ParamKind::Validatable]);
    }

    #[test]
    fn test_status_code_param() {
        let mut param = StatusCodeParam::default();
        assert!(param.validate("418"));
        assert_eq!(param.code, 418);
        assert!(!StatusCodeParam::default().validate("4180"));
        assert!(!StatusCodeParam::default().validate("abc"));
    }
}
