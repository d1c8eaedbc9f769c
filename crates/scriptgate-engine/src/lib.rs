//! # Scriptgate Engine
//!
//! Sandboxed script execution for the Scriptgate server.
//!
//! A [`Sandbox`] is an isolated, single-use Rhai interpreter instance: it is
//! created fresh for every request, hardened with resource limits before any
//! script runs, seeded by an operator-provided [`Bootstrap`], and discarded
//! when the request completes. Host functionality reaches scripts only
//! through explicitly installed [`Capability`] entries.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod bootstrap;
pub mod capability;
pub mod error;
pub mod sandbox;

pub use bootstrap::{Bootstrap, BootstrapConfig};
pub use capability::{Capability, CapabilitySet};
pub use error::{Result, ScriptError};
pub use sandbox::{Sandbox, SandboxLimits};

// Re-export the value type crossing the host/script boundary
pub use rhai::Dynamic;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::bootstrap::{Bootstrap, BootstrapConfig};
    pub use crate::capability::{Capability, CapabilitySet};
    pub use crate::error::{Result, ScriptError};
    pub use crate::sandbox::{Sandbox, SandboxLimits};
    pub use rhai::Dynamic;
}
