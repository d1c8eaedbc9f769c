//! # Scriptgate Server
//!
//! The serving half of Scriptgate:
//! - Namespace registration and lookup
//! - The per-request dispatch pipeline
//! - The axum transport adapter (`POST /`)
//! - Configuration loading and validation
//! - Server lifecycle with graceful shutdown

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod config;
pub mod dispatcher;
pub mod registry;
pub mod server;
pub mod shutdown;
pub mod transport;

pub use config::{load_config, validate_config, ServerConfig};
pub use dispatcher::Dispatcher;
pub use registry::{NamespaceHandlers, NamespaceRegistry, DEFAULT_NAMESPACE, RESPOND_CAPABILITY};
pub use server::{Server, ServerBuilder};
pub use shutdown::{ShutdownSignal, SignalHandler};
pub use transport::router;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{load_config, ServerConfig};
    pub use crate::dispatcher::Dispatcher;
    pub use crate::registry::{NamespaceHandlers, NamespaceRegistry, DEFAULT_NAMESPACE};
    pub use crate::server::{Server, ServerBuilder};
    pub use crate::shutdown::{ShutdownSignal, SignalHandler};
    pub use scriptgate_core::{Error, RequestEnvelope, ResponseEnvelope, ResponseGate};
    pub use scriptgate_engine::{
        Bootstrap, BootstrapConfig, Capability, CapabilitySet, Dynamic, Sandbox, SandboxLimits,
        ScriptError,
    };
}
