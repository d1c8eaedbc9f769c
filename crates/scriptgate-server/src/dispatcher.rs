//! Per-request execution pipeline
//!
//! One request maps to exactly one sandbox and exactly one outbound
//! envelope. The pipeline: validate the envelope, resolve the namespace,
//! create and bootstrap a fresh sandbox, install the `respond` capability,
//! run the namespace's request handler, and convert any failure into an
//! error envelope at this boundary.

use crate::registry::{NamespaceRegistry, RESPOND_CAPABILITY};
use scriptgate_core::{Error, RequestEnvelope, ResponseEnvelope, ResponseGate, StatusCode};
use scriptgate_engine::{Bootstrap, Sandbox, SandboxLimits};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Orchestrates one request end-to-end.
///
/// Cheap to clone; the registry and bootstrap are written once at startup
/// and shared read-only across request tasks.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<NamespaceRegistry>,
    bootstrap: Arc<Bootstrap>,
    limits: SandboxLimits,
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher.
    pub fn new(
        registry: Arc<NamespaceRegistry>,
        bootstrap: Arc<Bootstrap>,
        limits: SandboxLimits,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            bootstrap,
            limits,
            timeout,
        }
    }

    /// Run one envelope through the pipeline, producing exactly one response.
    ///
    /// Script interpretation is synchronous and not preemptible, so it runs
    /// on a blocking thread; the configured deadline bounds how long the
    /// caller waits for it. All failures come back as envelopes, never as
    /// errors that could kill the serving task.
    pub async fn dispatch(&self, envelope: RequestEnvelope) -> ResponseEnvelope {
        if envelope.script.is_empty() {
            return ResponseEnvelope::bad_request("`script` is required");
        }

        let namespace = self.registry.resolve(&envelope.namespace).to_string();
        if self.registry.get(&namespace).is_none() {
            debug!(%namespace, "namespace lookup miss");
            return ResponseEnvelope::from_error(&Error::NamespaceNotFound(namespace));
        }

        let this = self.clone();
        let script = envelope.script;
        let task = tokio::task::spawn_blocking(move || this.execute(&namespace, &script));

        let joined = match self.timeout {
            Some(deadline) => match tokio::time::timeout(deadline, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(timeout_ms = deadline.as_millis() as u64, "script execution timed out");
                    return ResponseEnvelope::from_error(&Error::Timeout(
                        deadline.as_millis() as u64
                    ));
                }
            },
            None => task.await,
        };

        match joined {
            Ok(response) => response,
            Err(join_err) => {
                warn!(error = %join_err, "script handler panicked");
                ResponseEnvelope::from_error(&Error::Internal(
                    "script handler panicked".to_string(),
                ))
            }
        }
    }

    /// Synchronous part of the pipeline: sandbox lifecycle and handler
    /// invocation. Runs on a blocking thread.
    fn execute(&self, namespace: &str, script: &str) -> ResponseEnvelope {
        let handlers = match self.registry.get(namespace) {
            Some(handlers) => handlers.clone(),
            // Unreachable while the registry stays immutable after startup
            None => {
                return ResponseEnvelope::from_error(&Error::NamespaceNotFound(
                    namespace.to_string(),
                ))
            }
        };

        let mut sandbox = Sandbox::new(&self.limits);
        if let Err(e) = self.bootstrap.apply(&mut sandbox) {
            warn!(error = %e, "bootstrap failed while preparing a sandbox");
            return ResponseEnvelope::from_error(&Error::Setup(e.to_string()));
        }

        let gate = ResponseGate::new();
        sandbox.install(RESPOND_CAPABILITY, (handlers.on_result)(gate.clone()));

        debug!(namespace, bytes = script.len(), "executing script");
        match (handlers.on_request)(&mut sandbox, script) {
            Ok(()) => {
                // Scripts are not obliged to respond. Close the request out
                // with an empty 200 instead of leaving the caller hanging;
                // first delivery wins, so a script that did respond is
                // unaffected.
                gate.deliver(StatusCode::OK.as_u16(), "");
            }
            Err(e) => {
                debug!(namespace, error = %e, "script handler failed");
                gate.deliver(StatusCode::BAD_REQUEST.as_u16(), e.to_string());
            }
        }

        gate.take().unwrap_or_else(|| {
            ResponseEnvelope::from_error(&Error::Internal("response gate was empty".to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{NamespaceHandlers, DEFAULT_NAMESPACE};
    use scriptgate_engine::{Capability, Dynamic};

    fn dispatcher_with(registry: NamespaceRegistry) -> Dispatcher {
        Dispatcher::new(
            Arc::new(registry),
            Arc::new(Bootstrap::default()),
            SandboxLimits::default(),
            Some(Duration::from_secs(5)),
        )
    }

    fn global_script_runner() -> Dispatcher {
        let mut registry = NamespaceRegistry::new();
        registry.register(DEFAULT_NAMESPACE, NamespaceHandlers::script_runner());
        dispatcher_with(registry)
    }

    /// Namespace exposing a `test()` native capability.
    fn global_with_test_capability() -> Dispatcher {
        let mut registry = NamespaceRegistry::new();
        registry.register(
            DEFAULT_NAMESPACE,
            NamespaceHandlers {
                on_request: Arc::new(|sandbox: &mut Sandbox, script: &str| {
                    sandbox.install("test", Capability::nullary(|| "Test succeeded!".into()));
                    sandbox.eval(script).map(|_| ())
                }),
                on_result: NamespaceHandlers::script_runner().on_result,
            },
        );
        dispatcher_with(registry)
    }

    #[tokio::test]
    async fn test_script_with_native_capability() {
        let dispatcher = global_with_test_capability();
        let response = dispatcher
            .dispatch(RequestEnvelope::new("respond(test())"))
            .await;
        assert_eq!(response, ResponseEnvelope::new(200, "Test succeeded!"));
    }

    #[tokio::test]
    async fn test_invalid_script_is_a_400() {
        let dispatcher = global_script_runner();
        let response = dispatcher.dispatch(RequestEnvelope::new("respond(")).await;
        assert_eq!(response.status, 400);
        assert!(response.body.contains("compilation error"));
    }

    #[tokio::test]
    async fn test_empty_script_is_rejected_before_any_sandbox() {
        let dispatcher = global_script_runner();
        let response = dispatcher.dispatch(RequestEnvelope::new("")).await;
        assert_eq!(response, ResponseEnvelope::new(400, "`script` is required"));
    }

    #[tokio::test]
    async fn test_unknown_namespace_is_a_404() {
        let dispatcher = global_script_runner();
        let response = dispatcher
            .dispatch(RequestEnvelope::for_namespace("missing", "respond(1)"))
            .await;
        assert_eq!(
            response,
            ResponseEnvelope::new(404, "Namespace doesn't exist: missing")
        );
    }

    #[tokio::test]
    async fn test_default_namespace_miss_is_a_404() {
        let dispatcher = dispatcher_with(NamespaceRegistry::new());
        let response = dispatcher.dispatch(RequestEnvelope::new("respond(1)")).await;
        assert_eq!(
            response,
            ResponseEnvelope::new(404, "Namespace doesn't exist: global")
        );
    }

    #[tokio::test]
    async fn test_empty_namespace_equals_explicit_default() {
        let dispatcher = global_script_runner();
        let implicit = dispatcher
            .dispatch(RequestEnvelope::new("respond(\"hi\")"))
            .await;
        let explicit = dispatcher
            .dispatch(RequestEnvelope::for_namespace(
                DEFAULT_NAMESPACE,
                "respond(\"hi\")",
            ))
            .await;
        assert_eq!(implicit, explicit);
    }

    #[tokio::test]
    async fn test_script_that_never_responds_gets_an_empty_200() {
        let dispatcher = global_script_runner();
        let response = dispatcher.dispatch(RequestEnvelope::new("1 + 1")).await;
        assert_eq!(response, ResponseEnvelope::new(200, ""));
    }

    #[tokio::test]
    async fn test_repeated_respond_keeps_the_first() {
        let dispatcher = global_script_runner();
        let response = dispatcher
            .dispatch(RequestEnvelope::new(
                "respond(\"first\"); respond(\"second\"); respond(\"third\")",
            ))
            .await;
        assert_eq!(response, ResponseEnvelope::new(200, "first"));
    }

    #[tokio::test]
    async fn test_respond_then_fault_keeps_the_response() {
        let dispatcher = global_script_runner();
        let response = dispatcher
            .dispatch(RequestEnvelope::new("respond(\"sent\"); undefined_var"))
            .await;
        assert_eq!(response, ResponseEnvelope::new(200, "sent"));
    }

    #[tokio::test]
    async fn test_execution_deadline_is_a_400() {
        let mut registry = NamespaceRegistry::new();
        registry.register(
            DEFAULT_NAMESPACE,
            NamespaceHandlers {
                on_request: Arc::new(|_: &mut Sandbox, _: &str| {
                    std::thread::sleep(Duration::from_millis(200));
                    Ok(())
                }),
                on_result: NamespaceHandlers::script_runner().on_result,
            },
        );
        let dispatcher = Dispatcher::new(
            Arc::new(registry),
            Arc::new(Bootstrap::default()),
            SandboxLimits::default(),
            Some(Duration::from_millis(50)),
        );

        let response = dispatcher.dispatch(RequestEnvelope::new("anything")).await;
        assert_eq!(
            response,
            ResponseEnvelope::new(400, "Script execution timed out after 50ms")
        );
    }

    #[tokio::test]
    async fn test_panicking_handler_is_a_500() {
        let mut registry = NamespaceRegistry::new();
        registry.register(
            DEFAULT_NAMESPACE,
            NamespaceHandlers {
                on_request: Arc::new(|_: &mut Sandbox, _: &str| panic!("handler blew up")),
                on_result: NamespaceHandlers::script_runner().on_result,
            },
        );
        let dispatcher = dispatcher_with(registry);

        let response = dispatcher.dispatch(RequestEnvelope::new("anything")).await;
        assert_eq!(
            response,
            ResponseEnvelope::new(500, "Internal error: script handler panicked")
        );
    }

    #[tokio::test]
    async fn test_bootstrap_runtime_fault_is_a_500() {
        let mut registry = NamespaceRegistry::new();
        registry.register(DEFAULT_NAMESPACE, NamespaceHandlers::script_runner());
        // Compiles fine, faults when applied to a sandbox
        let bootstrap = Bootstrap::load(
            &scriptgate_engine::BootstrapConfig::inline("throw \"boom\";"),
            &SandboxLimits::default(),
        )
        .unwrap();
        let dispatcher = Dispatcher::new(
            Arc::new(registry),
            Arc::new(bootstrap),
            SandboxLimits::default(),
            None,
        );

        let response = dispatcher.dispatch(RequestEnvelope::new("respond(1)")).await;
        assert_eq!(response.status, 500);
        assert!(response.body.starts_with("Setup error:"));
        assert!(response.body.contains("boom"));
    }

    #[tokio::test]
    async fn test_bootstrap_constants_reach_scripts() {
        let mut registry = NamespaceRegistry::new();
        registry.register(DEFAULT_NAMESPACE, NamespaceHandlers::script_runner());
        let bootstrap = Bootstrap::load(
            &scriptgate_engine::BootstrapConfig::inline("const MOTD = \"welcome\";"),
            &SandboxLimits::default(),
        )
        .unwrap();
        let dispatcher = Dispatcher::new(
            Arc::new(registry),
            Arc::new(bootstrap),
            SandboxLimits::default(),
            None,
        );

        let response = dispatcher.dispatch(RequestEnvelope::new("respond(MOTD)")).await;
        assert_eq!(response, ResponseEnvelope::new(200, "welcome"));
    }

    #[tokio::test]
    async fn test_concurrent_requests_do_not_share_state() {
        let dispatcher = global_script_runner();

        let writer = dispatcher.dispatch(RequestEnvelope::new("let stash = 1; respond(\"set\")"));
        let reader = dispatcher.dispatch(RequestEnvelope::new("respond(stash)"));
        let (wrote, read) = tokio::join!(writer, reader);

        assert_eq!(wrote, ResponseEnvelope::new(200, "set"));
        // The second sandbox never saw the first one's variable
        assert_eq!(read.status, 400);
    }

    #[tokio::test]
    async fn test_handler_error_body_is_the_failure_message() {
        let mut registry = NamespaceRegistry::new();
        registry.register(
            DEFAULT_NAMESPACE,
            NamespaceHandlers {
                on_request: Arc::new(|_: &mut Sandbox, _: &str| {
                    Err(scriptgate_engine::ScriptError::invalid_source("refused"))
                }),
                on_result: Arc::new(|gate| {
                    Capability::unary(move |value: Dynamic| {
                        gate.deliver(200, value.to_string());
                        Dynamic::UNIT
                    })
                }),
            },
        );
        let dispatcher = dispatcher_with(registry);
        let response = dispatcher.dispatch(RequestEnvelope::new("anything")).await;
        assert_eq!(
            response,
            ResponseEnvelope::new(400, "Invalid script source: refused")
        );
    }
}
