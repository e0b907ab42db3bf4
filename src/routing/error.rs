//! Routing error definitions.

use thiserror::Error;

/// Errors raised while registering, looking up or dispatching a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Pattern or request path does not start with `/` or has empty segments.
    #[error("invalid path format: {0:?}")]
    InvalidPathFormat(String),

    /// A handler is already registered for this exact pattern.
    #[error("path already registered: {0}")]
    AlreadyPathRegistered(String),

    /// Attempt to register a segment below an existing wildcard.
    #[error("cannot register {0} below a wildcard segment")]
    AlreadyWildcardPathRegistered(String),

    /// No route structurally matches the path for this method.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// The route's handler reference cannot be called.
    #[error("handler {0:?} is not callable")]
    InvalidHandler(String),

    /// A raw path value failed integer coercion or custom validation.
    #[error("invalid parameter #{position} ({value:?}): {reason}")]
    InvalidParam {
        position: usize,
        value: String,
        reason: String,
    },

    /// A configured route names something that is not an HTTP method.
    #[error("invalid method {0:?}")]
    InvalidMethod(String),

    /// Captured parameter count does not match the handler's arity.
    #[error("handler expects {expected} path parameters, got {actual}")]
    NotFoundHandler { expected: usize, actual: usize },
}

/// Result type for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;
