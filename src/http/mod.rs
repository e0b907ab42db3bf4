//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, trace span)
//!     → body buffered into request.rs `Request`
//!     → routing table lookup and handler dispatch
//!     → handler writes into response.rs `ResponseWriter`
//!     → converted to an Axum response and sent to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Request, RequestExt, X_REQUEST_ID};
pub use response::ResponseWriter;
pub use server::{reload_routes, AppState, HttpServer};
