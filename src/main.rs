//! Segment-trie HTTP router service.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                TRIE ROUTER                   │
//!                        │                                              │
//!   Client Request       │  ┌─────────┐   ┌────────────┐   ┌─────────┐  │
//!   ─────────────────────┼─▶│  http   │──▶│  routing   │──▶│ handler │  │
//!                        │  │ server  │   │ (per-method│   │ binding │  │
//!                        │  └─────────┘   │   tries)   │   └────┬────┘  │
//!                        │       ▲        └─────▲──────┘        │       │
//!   Client Response      │       │              │ swap           ▼       │
//!   ◀────────────────────┼───────┴──────────────┼──────── ResponseWriter│
//!                        │                      │                       │
//!                        │  ┌─────────┐   ┌─────┴──────┐                 │
//!                        │  │lifecycle│   │   config   │                 │
//!                        │  │shutdown │   │load/watch  │                 │
//!                        │  └─────────┘   └────────────┘                 │
//!                        └──────────────────────────────────────────────┘
//! ```
//!
//! # Commands
//!
//! - `serve` (default): bind the listener and serve the configured routes
//! - `routes`: print the route table
//! - `match METHOD PATH`: show which route a request would reach

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::http::Method;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use trie_router::config::{load_config, ConfigWatcher, RouterConfig};
use trie_router::http::{HttpServer, Request, ResponseWriter};
use trie_router::lifecycle::{spawn_signal_handler, Shutdown};
use trie_router::observability::init_logging;
use trie_router::routing::matcher;
use trie_router::{builtin, Router};

#[derive(Parser)]
#[command(name = "trie-router")]
#[command(about = "Per-method segment-trie HTTP router", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "router.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the configured routes
    Serve,
    /// Print the route table
    Routes {
        /// Emit JSON instead of one line per route
        #[arg(long)]
        json: bool,
    },
    /// Show which route a request would reach
    Match {
        /// HTTP method, e.g. GET
        method: String,
        /// Request path, optionally with a query string
        path: String,
    },
}

/// Load the config file, or defaults when it does not exist.
fn load(path: &Path) -> Result<(RouterConfig, bool), Box<dyn std::error::Error>> {
    if path.exists() {
        Ok((load_config(path)?, true))
    } else {
        Ok((RouterConfig::default(), false))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let (config, from_file) = load(&cli.config)?;

    init_logging(&config.observability)?;
    if !from_file {
        tracing::warn!(path = ?cli.config, "Config file not found, using defaults");
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, &cli.config, from_file).await,
        Commands::Routes { json } => {
            let table = Router::from_config(&config.routing, &config.routes, &builtin::registry())?;
            let mut out = io::stdout().lock();
            if json {
                serde_json::to_writer_pretty(&mut out, table.routes())?;
                writeln!(out)?;
            } else {
                table.print_routes(&mut out)?;
            }
            Ok(())
        }
        Commands::Match { method, path } => match_route(&config, &method, &path),
    }
}

async fn serve(
    config: RouterConfig,
    config_path: &Path,
    watch: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("trie-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        strict = config.routing.strict,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = if watch {
        let (watcher, rx) = ConfigWatcher::new(config_path);
        (Some(watcher.run()?), rx)
    } else {
        let (_, rx) = mpsc::unbounded_channel();
        (None, rx)
    };

    let shutdown = Shutdown::new();
    spawn_signal_handler(&shutdown);

    let server = HttpServer::new(config, builtin::registry())?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn match_route(config: &RouterConfig, method: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let table = Router::from_config(&config.routing, &config.routes, &builtin::registry())?;
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
    let mut out = io::stdout().lock();

    let matched = match table.lookup(path, &method) {
        Ok(matched) => matched,
        Err(e) => {
            writeln!(out, "no match: {e}")?;
            return Ok(());
        }
    };

    writeln!(out, "pattern: {}", matched.pattern())?;
    writeln!(out, "handler: {}", matched.endpoint().name())?;
    for (name, value) in matcher::param_names(matched.pattern()).iter().zip(matched.params()) {
        writeln!(out, "  {name} = {value}")?;
    }

    let request: Request = axum::http::Request::builder()
        .method(method.clone())
        .uri(path)
        .body(Bytes::new())?;
    let mut writer = ResponseWriter::new();
    match table.dispatch(&matched, &mut writer, &request) {
        Ok(()) => {
            writeln!(out, "status: {}", writer.status())?;
            write!(out, "{}", writer.text())?;
        }
        Err(e) => writeln!(out, "dispatch failed: {e}")?,
    }
    Ok(())
}
