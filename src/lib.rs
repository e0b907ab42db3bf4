//! Per-method segment-trie HTTP router.

pub mod builtin;
pub mod config;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use handler::{Endpoint, Handler, HandlerRegistry, ParamKind, Valid, Validate};
pub use http::{HttpServer, Request, ResponseWriter};
pub use lifecycle::Shutdown;
pub use routing::{RouteError, Router, RouterBuilder};
