//! Namespace registration and lookup
//!
//! A namespace is a named routing bucket selecting which request/result
//! handler pair processes a submitted script. The registry is populated at
//! startup and read-only while serving, so concurrent lookups need no
//! synchronization.

use scriptgate_core::{ResponseGate, StatusCode};
use scriptgate_engine::{Capability, CapabilitySet, Dynamic, Sandbox};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Reserved namespace used when a request names none.
pub const DEFAULT_NAMESPACE: &str = "global";

/// Name under which the response capability is installed into sandboxes.
pub const RESPOND_CAPABILITY: &str = "respond";

/// Handler invoked with the request's sandbox and the submitted script.
///
/// Implementations typically install namespace-specific capabilities and
/// then evaluate the script. A returned error becomes the 400 envelope for
/// the request.
pub type RequestHandler =
    Arc<dyn Fn(&mut Sandbox, &str) -> scriptgate_engine::Result<()> + Send + Sync>;

/// Factory producing the `respond` capability for one request.
///
/// Called once per request with that request's [`ResponseGate`]; the
/// returned capability fixes the status code its deliveries use (commonly
/// 200).
pub type ResultFactory = Arc<dyn Fn(ResponseGate) -> Capability + Send + Sync>;

/// Request/result handler pair owned by one namespace.
#[derive(Clone)]
pub struct NamespaceHandlers {
    /// Called to execute the submitted script.
    pub on_request: RequestHandler,
    /// Called to build the `respond` capability for a request.
    pub on_result: ResultFactory,
}

impl NamespaceHandlers {
    /// Create a handler pair.
    pub fn new(on_request: RequestHandler, on_result: ResultFactory) -> Self {
        Self {
            on_request,
            on_result,
        }
    }

    /// Plain pass-through pair: the script is evaluated as-is and `respond`
    /// answers 200 with its argument rendered as a string.
    pub fn script_runner() -> Self {
        Self {
            on_request: Arc::new(|sandbox: &mut Sandbox, script: &str| {
                sandbox.eval(script).map(|_| ())
            }),
            on_result: Arc::new(|gate: ResponseGate| {
                Capability::unary(move |value: Dynamic| {
                    gate.deliver(StatusCode::OK.as_u16(), value.to_string());
                    Dynamic::UNIT
                })
            }),
        }
    }

    /// Like [`script_runner`](Self::script_runner), but every sandbox gets
    /// the given capabilities installed before the script runs.
    pub fn with_capabilities(set: CapabilitySet) -> Self {
        Self {
            on_request: Arc::new(move |sandbox: &mut Sandbox, script: &str| {
                sandbox.install_all(&set);
                sandbox.eval(script).map(|_| ())
            }),
            on_result: Self::script_runner().on_result,
        }
    }
}

impl fmt::Debug for NamespaceHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NamespaceHandlers")
    }
}

/// Mapping from namespace name to handlers.
///
/// Registration happens before serving begins; no mutation afterwards.
#[derive(Debug, Default)]
pub struct NamespaceRegistry {
    handlers: HashMap<String, NamespaceHandlers>,
}

impl NamespaceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register handlers under a namespace name. Startup only.
    pub fn register(&mut self, name: impl Into<String>, handlers: NamespaceHandlers) {
        self.handlers.insert(name.into(), handlers);
    }

    /// Resolve a requested name; empty names select the default namespace.
    pub fn resolve<'a>(&self, name: &'a str) -> &'a str {
        if name.is_empty() {
            DEFAULT_NAMESPACE
        } else {
            name
        }
    }

    /// Look up handlers by (already resolved) namespace name.
    pub fn get(&self, name: &str) -> Option<&NamespaceHandlers> {
        self.handlers.get(name)
    }

    /// Number of registered namespaces.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no namespace is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered namespace names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptgate_engine::SandboxLimits;

    #[test]
    fn test_empty_name_resolves_to_default() {
        let registry = NamespaceRegistry::new();
        assert_eq!(registry.resolve(""), DEFAULT_NAMESPACE);
        assert_eq!(registry.resolve("math"), "math");
    }

    #[test]
    fn test_lookup_miss_includes_unregistered_default() {
        let registry = NamespaceRegistry::new();
        assert!(registry.get(DEFAULT_NAMESPACE).is_none());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = NamespaceRegistry::new();
        registry.register(DEFAULT_NAMESPACE, NamespaceHandlers::script_runner());
        assert_eq!(registry.len(), 1);
        assert!(registry.get(DEFAULT_NAMESPACE).is_some());
    }

    #[test]
    fn test_with_capabilities_installs_the_set() {
        let set = CapabilitySet::new()
            .with("version", Capability::nullary(|| "1.0".into()))
            .with("echo", Capability::unary(|v| v));
        let handlers = NamespaceHandlers::with_capabilities(set);
        let gate = ResponseGate::new();

        let mut sandbox = Sandbox::new(&SandboxLimits::default());
        sandbox.install(RESPOND_CAPABILITY, (handlers.on_result)(gate.clone()));
        (handlers.on_request)(&mut sandbox, "respond(echo(version()))").unwrap();

        assert_eq!(gate.take().unwrap().body, "1.0");
    }

    #[test]
    fn test_script_runner_responds_with_200() {
        let handlers = NamespaceHandlers::script_runner();
        let gate = ResponseGate::new();

        let mut sandbox = Sandbox::new(&SandboxLimits::default());
        sandbox.install(RESPOND_CAPABILITY, (handlers.on_result)(gate.clone()));
        (handlers.on_request)(&mut sandbox, "respond(\"done\")").unwrap();

        let envelope = gate.take().unwrap();
        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.body, "done");
    }
}
