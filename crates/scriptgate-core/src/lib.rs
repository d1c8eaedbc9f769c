//! # Scriptgate Core
//!
//! Core types and error handling for the Scriptgate scripting server.
//!
//! This crate provides the foundational abstractions shared by the engine
//! and server crates:
//! - Request/response envelopes
//! - The at-most-once response gate
//! - Error types and status-code mapping

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod envelope;
pub mod error;
pub mod gate;

pub use envelope::{RequestEnvelope, ResponseEnvelope};
pub use error::{Error, Result};
pub use gate::ResponseGate;

// Re-export commonly used HTTP types
pub use http::StatusCode;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::envelope::{RequestEnvelope, ResponseEnvelope};
    pub use crate::error::{Error, Result};
    pub use crate::gate::ResponseGate;
}
