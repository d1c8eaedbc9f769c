//! Host capabilities exposed to sandboxed scripts
//!
//! A capability is a host-provided native function installed into a sandbox
//! under a name. Scripts have no ambient access to the host; whatever a
//! namespace wants to expose, it expresses as capabilities.

use rhai::Dynamic;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared nullary host function.
pub type NullaryFn = Arc<dyn Fn() -> Dynamic + Send + Sync>;

/// Shared unary host function.
pub type UnaryFn = Arc<dyn Fn(Dynamic) -> Dynamic + Send + Sync>;

/// A host-provided native function exposed into the sandbox.
///
/// Entries may close over request-scoped state (the `respond` capability
/// captures that request's response gate).
#[derive(Clone)]
pub enum Capability {
    /// Function taking no arguments
    Nullary(NullaryFn),
    /// Function taking one value
    Unary(UnaryFn),
}

impl Capability {
    /// Wrap a nullary host function.
    pub fn nullary(f: impl Fn() -> Dynamic + Send + Sync + 'static) -> Self {
        Self::Nullary(Arc::new(f))
    }

    /// Wrap a unary host function.
    pub fn unary(f: impl Fn(Dynamic) -> Dynamic + Send + Sync + 'static) -> Self {
        Self::Unary(Arc::new(f))
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nullary(_) => f.write_str("Capability::Nullary"),
            Self::Unary(_) => f.write_str("Capability::Unary"),
        }
    }
}

/// Flat, name-keyed table of capabilities installed together.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    entries: HashMap<String, Capability>,
}

impl CapabilitySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a capability, replacing any previous entry under the same name.
    pub fn with(mut self, name: impl Into<String>, capability: Capability) -> Self {
        self.entries.insert(name.into(), capability);
        self
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Capability)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_set_builder() {
        let set = CapabilitySet::new()
            .with("version", Capability::nullary(|| "1.0".into()))
            .with("echo", Capability::unary(|v| v));

        assert_eq!(set.len(), 2);
        assert!(set.iter().any(|(name, _)| name == "echo"));
    }

    #[test]
    fn test_capability_set_replaces_duplicates() {
        let set = CapabilitySet::new()
            .with("version", Capability::nullary(|| "1.0".into()))
            .with("version", Capability::nullary(|| "2.0".into()));

        assert_eq!(set.len(), 1);
    }
}
