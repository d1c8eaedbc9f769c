//! Bootstrap environment applied to every sandbox
//!
//! A bootstrap is operator-provided source text executed in a sandbox
//! before the user script, typically to define helper constants or tighten
//! the environment further. It is compiled exactly once at startup and the
//! compiled form is re-run per sandbox, so there is a single interpreter
//! state per request and parse cost is paid only once.

use crate::error::{Result, ScriptError};
use crate::sandbox::{Sandbox, SandboxLimits};
use rhai::AST;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, trace};

/// Operator-facing bootstrap configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Inline bootstrap source.
    pub script: Option<String>,
    /// Path to a bootstrap source file. Takes priority over `script`.
    pub file: Option<PathBuf>,
}

impl BootstrapConfig {
    /// Config with an inline bootstrap script.
    pub fn inline(script: impl Into<String>) -> Self {
        Self {
            script: Some(script.into()),
            file: None,
        }
    }

    /// Config with a file-based bootstrap script.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            script: None,
            file: Some(path.into()),
        }
    }
}

/// A bootstrap compiled once at startup and applied to every new sandbox.
///
/// When neither an inline script nor a file is configured the bootstrap is
/// empty and [`apply`](Bootstrap::apply) is a no-op; the sandbox's own
/// hardening (see [`Sandbox::new`]) is the security default in that case.
#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    ast: Option<AST>,
}

impl Bootstrap {
    /// Read and compile the configured bootstrap source.
    ///
    /// Failure to read the file or to compile the source is a fatal setup
    /// error surfaced to the caller; it never becomes a per-request 4xx.
    /// Compilation uses the same limits sandboxes are created with, so a
    /// bootstrap that cannot run in production fails here instead of on the
    /// first request.
    pub fn load(config: &BootstrapConfig, limits: &SandboxLimits) -> Result<Self> {
        let source = match (&config.file, &config.script) {
            (Some(path), _) => {
                debug!(path = %path.display(), "loading bootstrap from file");
                Some(std::fs::read_to_string(path).map_err(|e| ScriptError::Io {
                    message: format!("failed to read bootstrap file {}: {}", path.display(), e),
                })?)
            }
            (None, Some(script)) => {
                debug!(bytes = script.len(), "loading inline bootstrap");
                Some(script.clone())
            }
            (None, None) => None,
        };

        let ast = match source {
            Some(src) => Some(Sandbox::new(limits).compile(&src)?),
            None => None,
        };

        Ok(Self { ast })
    }

    /// Whether a bootstrap source is configured.
    pub fn is_configured(&self) -> bool {
        self.ast.is_some()
    }

    /// Run the bootstrap in `sandbox`, before any user script.
    ///
    /// Variables and constants the bootstrap defines land in the sandbox's
    /// scope and are visible to the user script that follows.
    pub fn apply(&self, sandbox: &mut Sandbox) -> Result<()> {
        if let Some(ast) = &self.ast {
            sandbox.eval_ast(ast)?;
            trace!("bootstrap applied");
        }
        Ok(())
    }
}
