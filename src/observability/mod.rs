//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!       (method, pattern, path, request_id, error)
//!     → logging.rs (filter, then pretty or JSON output)
//!
//! Per request:
//!     → TraceLayer span
//!     → x-request-id set or propagated
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every log line of a request
//! - Rejected route registrations are warnings, not failures

pub mod logging;

pub use logging::init_logging;
