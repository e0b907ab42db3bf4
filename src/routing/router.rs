//! Route registration, lookup and dispatch.
//!
//! # Responsibilities
//! - Hold one [`RouteTree`] per HTTP method
//! - Apply the registration policy (log-and-skip, or strict)
//! - Look up the route for a request and dispatch to its handler
//! - Fall back to the not-found handler on any lookup or dispatch error
//!
//! # Design Decisions
//! - Two phases: [`RouterBuilder`] is mutable and used only while
//!   registering; [`Router`] is immutable and shared across requests
//! - Changing routes after serving starts means building a new `Router`
//!   and swapping it in; there is no in-place mutation to race with
//! - "No route" and "route matched but arguments invalid" look the same
//!   to the caller: both end in the not-found handler

use std::collections::HashMap;
use std::fmt;
use std::io;

use axum::http::{Method, StatusCode};
use serde::Serialize;
use thiserror::Error;

use crate::config::{RouteConfig, RoutingConfig};
use crate::handler::{Endpoint, Handler, HandlerRegistry, ParamKind};
use crate::http::{Request, RequestExt, ResponseWriter};
use crate::routing::error::{RouteError, RouteResult};
use crate::routing::matcher;
use crate::routing::segment;
use crate::routing::tree::RouteTree;

/// Body written by the default not-found handler.
pub const NOT_FOUND_BODY: &str = "404 page not found\n";

fn default_not_found(w: &mut ResponseWriter, _req: &Request) {
    w.set_status(StatusCode::NOT_FOUND);
    w.write(NOT_FOUND_BODY);
}

/// A registered route, as listed by [`Router::routes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub method: String,
    pub pattern: String,
    pub handler: String,
    pub params: Vec<ParamKind>,
}

impl RouteInfo {
    fn new(method: &Method, pattern: &str, endpoint: &Endpoint) -> Self {
        Self {
            method: method.to_string(),
            pattern: pattern.to_string(),
            handler: endpoint.name().to_string(),
            params: endpoint.param_kinds().to_vec(),
        }
    }
}

impl fmt::Display for RouteInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {:?} -> {}", self.method, self.pattern, self.handler)
    }
}

/// A registration skipped under the log-and-skip policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Method as written; it may not be a valid token.
    pub method: String,
    pub pattern: String,
    pub error: RouteError,
}

/// Errors turning registrations into a [`Router`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{} route registration(s) rejected, first: {}", .0.len(), first_error(.0))]
    Rejected(Vec<Rejection>),
}

fn first_error(rejected: &[Rejection]) -> String {
    rejected
        .first()
        .map(|r| format!("[{}] {}: {}", r.method, r.pattern, r.error))
        .unwrap_or_default()
}

/// A successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    endpoint: &'a Endpoint,
    pattern: &'a str,
    params: Vec<String>,
}

impl<'a> RouteMatch<'a> {
    pub fn endpoint(&self) -> &'a Endpoint {
        self.endpoint
    }

    /// The pattern as it was registered.
    pub fn pattern(&self) -> &'a str {
        self.pattern
    }

    /// Raw captured values, left to right.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Captured value for a declared parameter or wildcard name.
    pub fn get(&self, name: &str) -> Option<&str> {
        matcher::param_names(self.pattern)
            .into_iter()
            .position(|n| n == name)
            .and_then(|idx| self.params.get(idx))
            .map(String::as_str)
    }
}

/// Mutable route table used during registration.
#[derive(Debug, Default)]
pub struct RouterBuilder {
    trees: HashMap<Method, RouteTree>,
    routes: Vec<RouteInfo>,
    rejected: Vec<Rejection>,
    not_found: Option<Endpoint>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `endpoint` for `method` and `pattern`.
    ///
    /// The method's tree is created by its first accepted route. Errors are
    /// returned to the caller and leave the table unchanged.
    pub fn insert(&mut self, method: Method, pattern: &str, endpoint: Endpoint) -> RouteResult<()> {
        let info = RouteInfo::new(&method, pattern, &endpoint);
        match self.trees.get_mut(&method) {
            Some(tree) => tree.insert(pattern, endpoint)?,
            None => {
                let mut tree = RouteTree::new();
                tree.insert(pattern, endpoint)?;
                self.trees.insert(method.clone(), tree);
            }
        }

        tracing::debug!(
            method = %method,
            pattern = %pattern,
            handler = %info.handler,
            "Route registered"
        );
        self.routes.push(info);
        Ok(())
    }

    /// Register an endpoint, logging and recording the route if it is rejected.
    pub fn route_endpoint(&mut self, method: Method, pattern: &str, endpoint: Endpoint) -> &mut Self {
        if let Err(error) = self.insert(method.clone(), pattern, endpoint) {
            self.reject(method.as_str(), pattern, error);
        }
        self
    }

    fn reject(&mut self, method: &str, pattern: &str, error: RouteError) {
        tracing::warn!(
            method = %method,
            pattern = %pattern,
            error = %error,
            "Skipping route"
        );
        self.rejected.push(Rejection {
            method: method.to_string(),
            pattern: pattern.to_string(),
            error,
        });
    }

    /// Register a handler with the log-and-skip policy.
    pub fn route<H, Args>(&mut self, method: Method, pattern: &str, handler: H) -> &mut Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.route_endpoint(method, pattern, Endpoint::from_handler(handler))
    }

    pub fn get<H, Args>(&mut self, pattern: &str, handler: H) -> &mut Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.route(Method::GET, pattern, handler)
    }

    pub fn head<H, Args>(&mut self, pattern: &str, handler: H) -> &mut Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.route(Method::HEAD, pattern, handler)
    }

    pub fn post<H, Args>(&mut self, pattern: &str, handler: H) -> &mut Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.route(Method::POST, pattern, handler)
    }

    pub fn put<H, Args>(&mut self, pattern: &str, handler: H) -> &mut Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.route(Method::PUT, pattern, handler)
    }

    pub fn patch<H, Args>(&mut self, pattern: &str, handler: H) -> &mut Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.route(Method::PATCH, pattern, handler)
    }

    pub fn delete<H, Args>(&mut self, pattern: &str, handler: H) -> &mut Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.route(Method::DELETE, pattern, handler)
    }

    pub fn options<H, Args>(&mut self, pattern: &str, handler: H) -> &mut Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.route(Method::OPTIONS, pattern, handler)
    }

    /// Replace the handler used when no route applies.
    pub fn not_found<H>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<()>,
    {
        self.not_found = Some(Endpoint::from_handler(handler));
        self
    }

    /// Registrations skipped so far.
    pub fn rejected(&self) -> &[Rejection] {
        &self.rejected
    }

    /// Freeze the table, keeping whatever was accepted.
    pub fn build(self) -> Router {
        Router {
            trees: self.trees,
            routes: self.routes,
            not_found: self
                .not_found
                .unwrap_or_else(|| Endpoint::named("not_found", default_not_found)),
        }
    }

    /// Freeze the table, failing if any registration was rejected.
    pub fn build_strict(self) -> Result<Router, BuildError> {
        if self.rejected.is_empty() {
            Ok(self.build())
        } else {
            Err(BuildError::Rejected(self.rejected))
        }
    }
}

/// Immutable route table shared by all request handlers.
#[derive(Debug)]
pub struct Router {
    trees: HashMap<Method, RouteTree>,
    routes: Vec<RouteInfo>,
    not_found: Endpoint,
}

impl Default for Router {
    fn default() -> Self {
        RouterBuilder::new().build()
    }
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Build a table from configuration-declared routes.
    ///
    /// Handler names resolve through `registry`. Under `strict` routing any
    /// rejected route fails the build; otherwise it is logged and skipped.
    pub fn from_config(
        routing: &RoutingConfig,
        routes: &[RouteConfig],
        registry: &HandlerRegistry,
    ) -> Result<Self, BuildError> {
        let mut builder = RouterBuilder::new();

        for route in routes {
            let method = match Method::from_bytes(route.method.to_ascii_uppercase().as_bytes()) {
                Ok(method) => method,
                Err(_) => {
                    let error = RouteError::InvalidMethod(route.method.clone());
                    builder.reject(&route.method, &route.path, error);
                    continue;
                }
            };

            let endpoint = registry.resolve(&route.handler);
            if !endpoint.is_callable() {
                tracing::warn!(
                    handler = %route.handler,
                    pattern = %route.path,
                    "Route refers to an unknown handler"
                );
            }
            builder.route_endpoint(method, &route.path, endpoint);
        }

        if let Some(name) = &routing.not_found_handler {
            match registry.resolve(name) {
                endpoint @ Endpoint::Bound(_) => builder.not_found = Some(endpoint),
                Endpoint::Unresolved(_) => {
                    tracing::warn!(handler = %name, "Unknown not-found handler, using the default")
                }
            }
        }

        if routing.strict {
            builder.build_strict()
        } else {
            Ok(builder.build())
        }
    }

    /// Find the route for `path` under `method`.
    ///
    /// Any query string is ignored. Fails with `PathNotFound` when the method
    /// has no routes or nothing matches structurally.
    pub fn lookup(&self, path: &str, method: &Method) -> RouteResult<RouteMatch<'_>> {
        let tree = self
            .trees
            .get(method)
            .ok_or_else(|| RouteError::PathNotFound(path.to_string()))?;

        let segments = segment::request_segments(path)?;
        let (leaf, params) = tree
            .find(&segments)
            .ok_or_else(|| RouteError::PathNotFound(path.to_string()))?;

        Ok(RouteMatch {
            endpoint: &leaf.endpoint,
            pattern: &leaf.pattern,
            params,
        })
    }

    /// Bind the captured values and call the matched handler.
    pub fn dispatch(&self, matched: &RouteMatch<'_>, w: &mut ResponseWriter, req: &Request) -> RouteResult<()> {
        matched.endpoint.call(w, req, &matched.params)
    }

    /// Look up and dispatch `req`, falling back to the not-found handler.
    ///
    /// Returns the error that caused the fallback, if any.
    pub fn serve(&self, w: &mut ResponseWriter, req: &Request) -> Option<RouteError> {
        let target = req.target();
        let result = self
            .lookup(target, req.method())
            .and_then(|matched| self.dispatch(&matched, w, req));

        let error = result.err()?;
        tracing::debug!(
            method = %req.method(),
            path = %target,
            error = %error,
            "Falling back to not-found handler"
        );

        w.reset();
        if let Err(not_found_error) = self.not_found.call(w, req, &[]) {
            tracing::error!(error = %not_found_error, "Not-found handler failed");
            default_not_found(w, req);
        }
        Some(error)
    }

    /// Registered routes, in registration order.
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    /// Methods with at least one route.
    pub fn methods(&self) -> Vec<&Method> {
        let mut methods: Vec<&Method> = self.trees.keys().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Write one `[METHOD] "pattern" -> handler` line per route.
    pub fn print_routes<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        for route in &self.routes {
            writeln!(out, "{route}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use std::fmt::Write as _;

    fn request(method: Method, uri: &str) -> Request {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    fn hello(w: &mut ResponseWriter, _req: &Request) {
        w.write("hello, world");
    }

    fn user(w: &mut ResponseWriter, _req: &Request, id: i64) {
        let _ = write!(w, "user {id}");
    }

    fn files(w: &mut ResponseWriter, _req: &Request, path: String) {
        w.write(path);
    }

    fn serve(router: &Router, method: Method, uri: &str) -> (ResponseWriter, Option<RouteError>) {
        let mut w = ResponseWriter::new();
        let error = router.serve(&mut w, &request(method, uri));
        (w, error)
    }

    #[test]
    fn test_lookup_and_get_by_name() {
        let mut builder = Router::builder();
        builder.get("/user/:id/files/*path", files);
        let router = builder.build();

        let matched = router.lookup("/user/7/files/a/b.txt?x=1", &Method::GET).unwrap();
        assert_eq!(matched.pattern(), "/user/:id/files/*path");
        assert_eq!(matched.params(), &["7".to_string(), "a/b.txt".to_string()]);
        assert_eq!(matched.get("id"), Some("7"));
        assert_eq!(matched.get("path"), Some("a/b.txt"));
        assert_eq!(matched.get("missing"), None);
    }

    #[test]
    fn test_lookup_unknown_method() {
        let mut builder = Router::builder();
        builder.get("/a", hello);
        let router = builder.build();
        assert_eq!(
            router.lookup("/a", &Method::POST).unwrap_err(),
            RouteError::PathNotFound("/a".into())
        );
        assert_eq!(
            router.lookup("a", &Method::GET).unwrap_err(),
            RouteError::InvalidPathFormat("a".into())
        );
    }

    #[test]
    fn test_serve_dispatches() {
        let mut builder = Router::builder();
        builder.get("/", hello).get("/user/:id", user);
        let router = builder.build();

        let (w, error) = serve(&router, Method::GET, "/user/42");
        assert!(error.is_none());
        assert_eq!(w.text(), "user 42");
        assert_eq!(w.status(), StatusCode::OK);
    }

    #[test]
    fn test_serve_falls_back_to_not_found() {
        let mut builder = Router::builder();
        builder.get("/user/:id", user);
        let router = builder.build();

        let (w, error) = serve(&router, Method::GET, "/user/abc");
        assert!(matches!(error, Some(RouteError::InvalidParam { .. })));
        assert_eq!(w.status(), StatusCode::NOT_FOUND);
        assert_eq!(w.text(), NOT_FOUND_BODY);

        let (w, error) = serve(&router, Method::GET, "/nothing");
        assert!(matches!(error, Some(RouteError::PathNotFound(_))));
        assert_eq!(w.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_custom_not_found() {
        let mut builder = Router::builder();
        builder.not_found(|w: &mut ResponseWriter, _req: &Request| {
            w.set_status(StatusCode::NOT_FOUND);
            w.write("nope");
        });
        let router = builder.build();

        let (w, _) = serve(&router, Method::GET, "/");
        assert_eq!(w.text(), "nope");
    }

    #[test]
    fn test_log_and_skip() {
        let mut builder = Router::builder();
        builder
            .get("/a", hello)
            .get("/a", user)
            .get("no-slash", hello)
            .get("/static/*p/x", files);

        let rejected: Vec<_> = builder.rejected().iter().map(|r| r.error.clone()).collect();
        assert_eq!(
            rejected,
            vec![
                RouteError::AlreadyPathRegistered("/a".into()),
                RouteError::InvalidPathFormat("no-slash".into()),
                RouteError::AlreadyWildcardPathRegistered("/static/*p/x".into()),
            ]
        );

        let router = builder.build();
        assert_eq!(router.routes().len(), 1);
        let (w, _) = serve(&router, Method::GET, "/a");
        assert_eq!(w.text(), "hello, world");
    }

    #[test]
    fn test_build_strict() {
        let mut builder = Router::builder();
        builder.get("/a", hello).get("/a", hello);
        match builder.build_strict() {
            Err(BuildError::Rejected(rejected)) => assert_eq!(rejected.len(), 1),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_print_routes() {
        let mut builder = Router::builder();
        builder
            .get("/", hello)
            .get("/bar/:id/:id", |_w: &mut ResponseWriter, _r: &Request, _a: i64, _b: i64| {})
            .post("/", hello);
        let router = builder.build();

        let mut out = Vec::new();
        router.print_routes(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[GET] \"/\" -> "));
        assert!(lines[0].ends_with("hello"));
        assert!(lines[1].starts_with("[GET] \"/bar/:id/:id\" -> "));
        assert!(lines[2].starts_with("[POST] \"/\" -> "));
        assert_eq!(router.routes()[1].params, vec![ParamKind::Integer, ParamKind::Integer]);
        assert_eq!(router.methods(), vec![&Method::GET, &Method::POST]);
    }

    #[test]
    fn test_from_config() {
        let mut registry = HandlerRegistry::new();
        registry.register("hello", hello).register("user", user);

        let routes = vec![
            RouteConfig::new("get", "/", "hello"),
            RouteConfig::new("GET", "/user/:id", "user"),
            RouteConfig::new("GET", "/ghost", "missing"),
            RouteConfig::new("GET", "/user/:name", "user"),
        ];

        let router = Router::from_config(&RoutingConfig::default(), &routes, &registry).unwrap();
        assert_eq!(router.routes().len(), 3);

        let (w, error) = serve(&router, Method::GET, "/ghost");
        assert_eq!(error, Some(RouteError::InvalidHandler("missing".into())));
        assert_eq!(w.status(), StatusCode::NOT_FOUND);

        let strict = RoutingConfig {
            strict: true,
            ..RoutingConfig::default()
        };
        assert!(matches!(
            Router::from_config(&strict, &routes, &registry),
            Err(BuildError::Rejected(_))
        ));

    }

    #[test]
    fn test_from_config_skips_bad_method() {
        let mut registry = HandlerRegistry::new();
        registry.register("hello", hello);

        let routes = vec![
            RouteConfig::new("GE T", "/broken", "hello"),
            RouteConfig::new("GET", "/", "hello"),
        ];

        let router = Router::from_config(&RoutingConfig::default(), &routes, &registry).unwrap();
        assert_eq!(router.routes().len(), 1);
        let (w, error) = serve(&router, Method::GET, "/");
        assert!(error.is_none());
        assert_eq!(w.text(), "hello, world");

        let strict = RoutingConfig {
            strict: true,
            ..RoutingConfig::default()
        };
        match Router::from_config(&strict, &routes, &registry) {
            Err(BuildError::Rejected(rejected)) => {
                assert_eq!(
                    rejected,
                    vec![Rejection {
                        method: "GE T".to_string(),
                        pattern: "/broken".to_string(),
                        error: RouteError::InvalidMethod("GE T".into()),
                    }]
                );
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_pattern_query_is_stripped_at_registration() {
        let mut builder = Router::builder();
        builder.get("/search?q=1", hello);
        assert!(builder.rejected().is_empty());
        let router = builder.build();

        assert_eq!(router.lookup("/search", &Method::GET).unwrap().pattern(), "/search?q=1");
        let (w, error) = serve(&router, Method::GET, "/search?q=2");
        assert!(error.is_none());
        assert_eq!(w.text(), "hello, world");
    }

    #[test]
    fn test_arity_mismatch_falls_back_to_not_found() {
        let mut builder = Router::builder();
        builder.get("/a/:id", hello).get("/b", user);
        let router = builder.build();

        let (w, error) = serve(&router, Method::GET, "/a/7");
        assert_eq!(error, Some(RouteError::NotFoundHandler { expected: 0, actual: 1 }));
        assert_eq!(w.status(), StatusCode::NOT_FOUND);
        assert_eq!(w.text(), NOT_FOUND_BODY);

        let (w, error) = serve(&router, Method::GET, "/b");
        assert_eq!(error, Some(RouteError::NotFoundHandler { expected: 1, actual: 0 }));
        assert_eq!(w.status(), StatusCode::NOT_FOUND);
    }
}
