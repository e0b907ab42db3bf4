//! Named handler registry.
//!
//! Routes declared in configuration refer to handlers by name. The registry
//! maps those names to handlers so a config reload can rebuild the route
//! table without recompiling.

use std::collections::HashMap;
use std::sync::Arc;

use crate::handler::{BoxedHandler, Endpoint, Handler};

/// Handlers available to configuration-declared routes.
#[derive(Debug, Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<BoxedHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, replacing any previous entry.
    pub fn register<H, Args>(&mut self, name: &str, handler: H) -> &mut Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        if self
            .handlers
            .insert(name.to_string(), Arc::new(BoxedHandler::new(name, handler)))
            .is_some()
        {
            tracing::warn!(handler = %name, "Handler name registered twice, keeping the latest");
        }
        self
    }

    /// Look up `name`; unknown names become an unresolved endpoint.
    pub fn resolve(&self, name: &str) -> Endpoint {
        match self.handlers.get(name) {
            Some(handler) => Endpoint::Bound(handler.clone()),
            None => Endpoint::Unresolved(name.to_string()),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Request, ResponseWriter};

    fn ping(w: &mut ResponseWriter, _req: &Request) {
        w.write("pong");
    }

    #[test]
    fn test_resolve() {
        let mut registry = HandlerRegistry::new();
        registry.register("ping", ping);

        let endpoint = registry.resolve("ping");
        assert!(endpoint.is_callable());
        assert_eq!(endpoint.name(), "ping");

        let missing = registry.resolve("nope");
        assert!(!missing.is_callable());
        assert_eq!(missing.name(), "nope");
        assert_eq!(registry.names(), vec!["ping"]);
    }
}
