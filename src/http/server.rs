//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app that hands every request to the route table
//! - Wire up middleware (tracing, timeout, request ID)
//! - Buffer request bodies before dispatch
//! - Swap in a rebuilt route table when configuration changes
//! - Bind server to listener and stop on the shutdown broadcast

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::request::Parts,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RouterConfig;
use crate::handler::HandlerRegistry;
use crate::http::request::{Request, RequestExt, X_REQUEST_ID};
use crate::http::response::ResponseWriter;
use crate::routing::{BuildError, Router as SegmentRouter};

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<ArcSwap<SegmentRouter>>,
}

/// HTTP server fronting the segment router.
pub struct HttpServer {
    app: Router,
    routes: Arc<ArcSwap<SegmentRouter>>,
    registry: Arc<HandlerRegistry>,
    config: RouterConfig,
}

impl HttpServer {
    /// Build the route table from `config` and wrap it in an HTTP app.
    pub fn new(config: RouterConfig, registry: HandlerRegistry) -> Result<Self, BuildError> {
        let table = SegmentRouter::from_config(&config.routing, &config.routes, &registry)?;
        Ok(Self::with_router(config, table, registry))
    }

    /// Serve an already built route table.
    pub fn with_router(config: RouterConfig, table: SegmentRouter, registry: HandlerRegistry) -> Self {
        tracing::info!(routes = table.routes().len(), "Route table ready");

        let routes = Arc::new(ArcSwap::from_pointee(table));
        let state = AppState {
            routes: routes.clone(),
        };

        let app = Self::build_app(&config, state);
        Self {
            app,
            routes,
            registry: Arc::new(registry),
            config,
        }
    }

    /// Build the Axum app with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &RouterConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.listener.max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(
                        |request: &axum::http::Request<Body>| {
                            let request_id = request
                                .headers()
                                .get(X_REQUEST_ID)
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or("unknown");
                            tracing::info_span!(
                                "request",
                                method = %request.method(),
                                uri = %request.uri(),
                                request_id = %request_id,
                            )
                        },
                    ))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The Axum app, for serving or for driving in tests.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Shared handle to the live route table.
    pub fn routes(&self) -> Arc<ArcSwap<SegmentRouter>> {
        self.routes.clone()
    }

    /// Get a reference to the config the server started with.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Every config received on `config_updates` rebuilds the route table.
    /// Listener and timeout settings only apply at startup.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let routes = self.routes.clone();
        let registry = self.registry.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match reload_routes(&routes, &config, &registry) {
                    Ok(count) => tracing::info!(routes = count, "Route table reloaded"),
                    Err(e) => {
                        tracing::error!(error = %e, "Route table rebuild failed, keeping current routes")
                    }
                }
            }
        });

        axum::serve(listener, self.app.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Rebuild the route table from `config` and swap it in.
///
/// On error the live table is left untouched. Returns the new route count.
pub fn reload_routes(
    routes: &ArcSwap<SegmentRouter>,
    config: &RouterConfig,
    registry: &HandlerRegistry,
) -> Result<usize, BuildError> {
    let table = SegmentRouter::from_config(&config.routing, &config.routes, registry)?;
    let count = table.routes().len();
    routes.store(Arc::new(table));
    Ok(count)
}

/// Buffer the body, then look up and run the route handler.
///
/// A body over the configured limit is answered with 413; any other body
/// error (e.g. a malformed chunk or a dropped client) with 400.
async fn dispatch_handler(
    State(state): State<AppState>,
    parts: Parts,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let bytes = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            tracing::warn!(
                status = %rejection.status(),
                error = %rejection.body_text(),
                "Rejecting request body"
            );
            return rejection.into_response();
        }
    };
    let request = Request::from_parts(parts, bytes);

    let table = state.routes.load();
    let mut writer = ResponseWriter::new();
    if let Some(error) = table.serve(&mut writer, &request) {
        tracing::debug!(
            request_id = request.request_id().unwrap_or("unknown"),
            error = %error,
            status = %writer.status(),
            "Request not routed"
        );
    }
    writer.into_response()
}
