//! At-most-once response delivery

use crate::envelope::ResponseEnvelope;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Single-use bridge between a sandboxed script and the waiting HTTP caller.
///
/// The gate is created per request and captured by the `respond` capability
/// installed into the sandbox. The first [`deliver`](ResponseGate::deliver)
/// within a request wins; every later attempt is a silent no-op, so an
/// untrusted script cannot corrupt response framing by calling `respond`
/// more than once. Clones share the same underlying slot.
#[derive(Debug, Clone, Default)]
pub struct ResponseGate {
    slot: Arc<Mutex<Option<ResponseEnvelope>>>,
}

impl ResponseGate {
    /// Create an empty gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a response through the gate.
    ///
    /// Returns `true` when this call filled the slot, `false` when a
    /// response was already delivered and this one was discarded.
    pub fn deliver(&self, status: u16, body: impl Into<String>) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            debug!(status, "duplicate response delivery ignored");
            return false;
        }
        *slot = Some(ResponseEnvelope::new(status, body));
        true
    }

    /// Whether a response has been delivered.
    pub fn delivered(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Take the delivered envelope, leaving the gate closed.
    pub fn take(&self) -> Option<ResponseEnvelope> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}
