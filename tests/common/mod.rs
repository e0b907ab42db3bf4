//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};

use trie_router::config::RouterConfig;
use trie_router::handler::HandlerRegistry;
use trie_router::http::{HttpServer, Request, ResponseWriter};
use trie_router::lifecycle::Shutdown;

pub fn hello(w: &mut ResponseWriter, _req: &Request) {
    w.write("hello, world");
}

pub fn user(w: &mut ResponseWriter, _req: &Request, id: i64) {
    let _ = write!(w, "user {id}");
}

pub fn files(w: &mut ResponseWriter, _req: &Request, path: String) {
    let _ = write!(w, "file {path}");
}

/// Registry used by the config-driven tests.
pub fn registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register("hello", hello)
        .register("user", user)
        .register("files", files);
    registry
}

/// Buffered request for driving a route table directly.
pub fn request(method: &str, uri: &str) -> Request {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
}

/// Request for driving the Axum app with `tower::ServiceExt::oneshot`.
pub fn http_request(method: &str, uri: &str) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// A server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub config_tx: mpsc::UnboundedSender<RouterConfig>,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Bind 127.0.0.1:0 and spawn `server` on it.
pub async fn spawn_server(server: HttpServer) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (config_tx, config_rx) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let shutdown_rx: broadcast::Receiver<()> = shutdown.subscribe();

    let handle = tokio::spawn(server.run(listener, config_rx, shutdown_rx));

    TestServer {
        addr,
        config_tx,
        shutdown,
        handle,
    }
}
