//! Server lifecycle
//!
//! [`ServerBuilder`] assembles the pieces written once at startup (config,
//! namespace registry, bootstrap); [`Server::run`] serves until the
//! shutdown signal fires.

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::registry::{NamespaceHandlers, NamespaceRegistry};
use crate::shutdown::{ShutdownSignal, SignalHandler};
use crate::transport;
use scriptgate_core::{Error, Result};
use scriptgate_engine::{Bootstrap, Sandbox};
use std::sync::Arc;

/// Probe executed by the optional startup self-test.
const SELF_TEST_SCRIPT: &str = r#"let probe = "scriptgate"; probe"#;

/// The Scriptgate HTTP server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    dispatcher: Dispatcher,
    shutdown: ShutdownSignal,
}

impl Server {
    /// Create a new server builder
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Address the server binds when run.
    pub fn listen_addr(&self) -> std::net::SocketAddr {
        self.config.listen
    }

    /// The request dispatcher (useful for driving the pipeline in tests).
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Build the axum router backed by this server's dispatcher.
    pub fn router(&self) -> axum::Router {
        transport::router(self.dispatcher.clone())
    }

    /// Get shutdown signal
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Run the server until shutdown is triggered, either by an OS signal
    /// (SIGINT/SIGTERM) or programmatically through
    /// [`shutdown_signal`](Server::shutdown_signal).
    pub async fn run(&self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.config.listen)
            .await
            .map_err(|e| {
                Error::Runtime(format!("Failed to bind to {}: {}", self.config.listen, e))
            })?;

        tracing::info!(listen = %self.config.listen, "Server starting");

        // OS signals feed the same broadcast as programmatic triggers
        tokio::spawn(SignalHandler::new(self.shutdown.clone()).run());

        let mut shutdown_rx = self.shutdown.subscribe();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                tracing::info!("Server shutting down gracefully");
            })
            .await
            .map_err(|e| Error::Runtime(format!("Server error: {e}")))?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Server builder
#[derive(Debug)]
pub struct ServerBuilder {
    config: Option<ServerConfig>,
    registry: NamespaceRegistry,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: None,
            registry: NamespaceRegistry::new(),
        }
    }

    /// Set configuration
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register a namespace. Startup only; the registry is immutable once
    /// the server is built.
    pub fn namespace(mut self, name: impl Into<String>, handlers: NamespaceHandlers) -> Self {
        self.registry.register(name, handlers);
        self
    }

    /// Build the server.
    ///
    /// Loads and compiles the bootstrap (a failure here aborts setup, never
    /// a request) and optionally runs the startup self-test.
    pub fn build(self) -> Result<Server> {
        let config = self
            .config
            .ok_or_else(|| Error::Config("config is required".to_string()))?;

        let bootstrap = Bootstrap::load(&config.bootstrap, &config.limits)
            .map_err(|e| Error::Setup(e.to_string()))?;

        if self.registry.is_empty() {
            tracing::warn!("no namespaces registered; every request will resolve to a miss");
        }

        if config.startup_self_test {
            let mut sandbox = Sandbox::new(&config.limits);
            bootstrap
                .apply(&mut sandbox)
                .and_then(|()| sandbox.eval(SELF_TEST_SCRIPT))
                .map_err(|e| Error::Setup(format!("startup self-test failed: {e}")))?;
            tracing::info!("startup self-test succeeded");
        }

        let dispatcher = Dispatcher::new(
            Arc::new(self.registry),
            Arc::new(bootstrap),
            config.limits.clone(),
            config.execution_timeout(),
        );

        tracing::info!(
            bootstrap = dispatcher_bootstrap_kind(&config),
            timeout_ms = config.execution_timeout_ms,
            "Server components initialized"
        );

        Ok(Server {
            config,
            dispatcher,
            shutdown: ShutdownSignal::new(),
        })
    }
}

fn dispatcher_bootstrap_kind(config: &ServerConfig) -> &'static str {
    if config.bootstrap.file.is_some() {
        "file"
    } else if config.bootstrap.script.is_some() {
        "inline"
    } else {
        "none"
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
