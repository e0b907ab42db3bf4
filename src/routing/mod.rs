//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (builder phase):
//!     (method, pattern, handler)
//!     → segment.rs (normalize, split, validate)
//!     → tree.rs (walk/extend the method's trie, detect conflicts)
//!     → rejected registrations logged and recorded, not fatal
//!     → RouterBuilder::build() freezes an immutable Router
//!
//! Incoming Request (method, path):
//!     → router.rs (pick the method's trie)
//!     → segment.rs (strip query, normalize, split)
//!     → tree.rs (greedy descent: literal, then param, then wildcard)
//!     → matcher.rs (extract raw values from the stored pattern)
//!     → handler binding and dispatch, or the not-found handler
//! ```
//!
//! # Design Decisions
//! - One trie per method, created on first registration
//! - Parameter and wildcard names are not part of a node's identity:
//!   `/user/:id` and `/user/:name` are the same route
//! - Lookup never backtracks; a literal child wins over a parameter even
//!   when the parameter branch would have matched deeper
//! - No regex anywhere in the hot path

pub mod error;
pub mod matcher;
pub mod router;
pub mod segment;
pub mod tree;

pub use error::{RouteError, RouteResult};
pub use router::{BuildError, Rejection, RouteInfo, RouteMatch, Router, RouterBuilder};
pub use tree::RouteTree;
