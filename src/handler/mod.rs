//! Typed route handlers.
//!
//! # Data Flow
//! ```text
//! Registration:
//!     fn(&mut ResponseWriter, &Request, A, B, ...)
//!     → Handler<(A, B, ...)> (generated impl, knows ParamKind of A, B)
//!     → BoxedHandler (type erased, shape kept as Vec<ParamKind>)
//!     → Endpoint stored on the trie leaf
//!
//! Request time:
//!     raw captured strings
//!     → arity check
//!     → param::bind::<A>, param::bind::<B>, ...
//!     → handler call
//! ```
//!
//! # Design Decisions
//! - Handler shape is known at registration, no runtime type inspection
//! - Handlers are synchronous and write into a buffered `ResponseWriter`
//! - Routes declared by name in config resolve through [`HandlerRegistry`];
//!   an unknown name is kept as [`Endpoint::Unresolved`] and fails at
//!   dispatch with `InvalidHandler`

pub mod param;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use crate::http::{Request, ResponseWriter};
use crate::routing::error::{RouteError, RouteResult};

pub use param::{FromParam, ParamKind, Valid, Validate};
pub use registry::HandlerRegistry;

/// A function usable as a route handler.
///
/// `Args` is the tuple of trailing argument types after the fixed response
/// writer and request arguments. Implemented for functions and closures
/// with up to eight trailing arguments.
pub trait Handler<Args>: Send + Sync + 'static {
    /// Kinds of the trailing arguments, in order.
    fn param_kinds(&self) -> Vec<ParamKind>;

    /// Bind `raw` to the trailing arguments and invoke the handler.
    fn call(&self, w: &mut ResponseWriter, req: &Request, raw: &[String]) -> RouteResult<()>;
}

macro_rules! impl_handler {
    ($($arg:ident),*) => {
        impl<F, $($arg,)*> Handler<($($arg,)*)> for F
        where
            F: Fn(&mut ResponseWriter, &Request, $($arg,)*) + Send + Sync + 'static,
            $($arg: FromParam,)*
        {
            fn param_kinds(&self) -> Vec<ParamKind> {
                vec![$(<$arg as FromParam>::KIND,)*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn call(&self, w: &mut ResponseWriter, req: &Request, raw: &[String]) -> RouteResult<()> {
                let expected = self.param_kinds().len();
                param::check_arity(expected, raw.len())?;

                let mut values = raw.iter().enumerate();
                $(
                    let $arg = match values.next() {
                        Some((position, value)) => param::bind::<$arg>(position, value)?,
                        None => {
                            return Err(RouteError::NotFoundHandler { expected, actual: raw.len() })
                        }
                    };
                )*

                (self)(w, req, $($arg,)*);
                Ok(())
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

type ErasedFn = dyn Fn(&mut ResponseWriter, &Request, &[String]) -> RouteResult<()> + Send + Sync;

/// A type-erased handler with its registration-time shape.
pub struct BoxedHandler {
    name: String,
    kinds: Vec<ParamKind>,
    inner: Box<ErasedFn>,
}

impl BoxedHandler {
    pub fn new<H, Args>(name: impl Into<String>, handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        let kinds = handler.param_kinds();
        Self {
            name: name.into(),
            kinds,
            inner: Box::new(move |w: &mut ResponseWriter, req: &Request, raw: &[String]| {
                handler.call(w, req, raw)
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_kinds(&self) -> &[ParamKind] {
        &self.kinds
    }

    pub fn call(&self, w: &mut ResponseWriter, req: &Request, raw: &[String]) -> RouteResult<()> {
        (self.inner)(w, req, raw)
    }
}

impl fmt::Debug for BoxedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedHandler")
            .field("name", &self.name)
            .field("kinds", &self.kinds)
            .finish_non_exhaustive()
    }
}

/// What a trie leaf dispatches to.
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// A callable handler.
    Bound(Arc<BoxedHandler>),
    /// A handler name that did not resolve; never callable.
    Unresolved(String),
}

impl Endpoint {
    /// Wrap a handler, naming it after its Rust type path.
    pub fn from_handler<H, Args>(handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        Self::named(std::any::type_name::<H>(), handler)
    }

    pub fn named<H, Args>(name: impl Into<String>, handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        Endpoint::Bound(Arc::new(BoxedHandler::new(name, handler)))
    }

    pub fn name(&self) -> &str {
        match self {
            Endpoint::Bound(handler) => handler.name(),
            Endpoint::Unresolved(name) => name,
        }
    }

    /// Expected trailing argument kinds; empty for unresolved endpoints.
    pub fn param_kinds(&self) -> &[ParamKind] {
        match self {
            Endpoint::Bound(handler) => handler.param_kinds(),
            Endpoint::Unresolved(_) => &[],
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Endpoint::Bound(_))
    }

    /// Bind the raw values and invoke the handler.
    pub fn call(&self, w: &mut ResponseWriter, req: &Request, raw: &[String]) -> RouteResult<()> {
        match self {
            Endpoint::Bound(handler) => handler.call(w, req, raw),
            Endpoint::Unresolved(name) => Err(RouteError::InvalidHandler(name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use std::fmt::Write as _;

    fn request() -> Request {
        axum::http::Request::builder().uri("/").body(Bytes::new()).unwrap()
    }

    fn hello(w: &mut ResponseWriter, _req: &Request) {
        w.write("hello, world");
    }

    fn with_params(w: &mut ResponseWriter, _req: &Request, id: i64, name: String) {
        let _ = write!(w, "id={id}, name={name}");
    }

    #[derive(Debug, Default)]
    struct Code {
        raw: String,
    }

    impl Validate for Code {
        fn validate(&mut self, raw: &str) -> bool {
            self.raw = raw.to_string();
            raw.len() == 3 && raw.bytes().all(|b| b.is_ascii_digit())
        }
    }

    fn with_code(w: &mut ResponseWriter, _req: &Request, code: Valid<Code>, id: i64) {
        let _ = write!(w, "raw={}, id={id}", code.raw);
    }

    fn call(endpoint: &Endpoint, raw: &[&str]) -> (RouteResult<()>, ResponseWriter) {
        let raw: Vec<String> = raw.iter().map(ToString::to_string).collect();
        let mut w = ResponseWriter::new();
        let result = endpoint.call(&mut w, &request(), &raw);
        (result, w)
    }

    #[test]
    fn test_param_kinds() {
        let endpoint = Endpoint::from_handler(with_params);
        assert_eq!(endpoint.param_kinds(), &[ParamKind::Integer, ParamKind::String]);
        assert!(endpoint.name().ends_with("with_params"));
        assert!(Endpoint::from_handler(hello).param_kinds().is_empty());
    }

    #[test]
    fn test_call_binds_params() {
        let (result, w) = call(&Endpoint::from_handler(with_params), &["10", "name"]);
        assert!(result.is_ok());
        assert_eq!(w.text(), "id=10, name=name");
    }

    #[test]
    fn test_call_arity_mismatch() {
        let (result, w) = call(&Endpoint::from_handler(with_params), &["10"]);
        assert_eq!(result, Err(RouteError::NotFoundHandler { expected: 2, actual: 1 }));
        assert!(w.body().is_empty());
    }

    #[test]
    fn test_call_invalid_integer() {
        let (result, _) = call(&Endpoint::from_handler(with_params), &["hoge", "name"]);
        assert!(matches!(result, Err(RouteError::InvalidParam { position: 0, .. })));
    }

    #[test]
    fn test_call_validatable_then_integer() {
        let endpoint = Endpoint::from_handler(with_code);
        let (result, w) = call(&endpoint, &["100", "10"]);
        assert!(result.is_ok());
        assert_eq!(w.text(), "raw=100, id=10");

        let (result, _) = call(&endpoint, &["1000", "10"]);
        assert!(matches!(result, Err(RouteError::InvalidParam { position: 0, .. })));
    }

    #[test]
    fn test_closure_handler() {
        let prefix = String::from("user");
        let endpoint = Endpoint::named("closure", move |w: &mut ResponseWriter, _req: &Request, id: i32| {
            let _ = write!(w, "{prefix}-{id}");
        });
        let (result, w) = call(&endpoint, &["7"]);
        assert!(result.is_ok());
        assert_eq!(w.text(), "user-7");
    }

    #[test]
    fn test_unresolved_is_not_callable() {
        let endpoint = Endpoint::Unresolved("missing".into());
        assert!(!endpoint.is_callable());
        let (result, _) = call(&endpoint, &[]);
        assert_eq!(result, Err(RouteError::InvalidHandler("missing".into())));
    }
}
