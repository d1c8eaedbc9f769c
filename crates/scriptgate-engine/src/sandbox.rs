//! Isolated per-request interpreter instances

use crate::capability::{Capability, CapabilitySet};
use crate::error::Result;
use rhai::{Dynamic, Engine, Scope, AST};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Resource limits applied to every sandbox.
///
/// These bound what a hostile or buggy script can consume even when no
/// wall-clock deadline is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxLimits {
    /// Maximum number of operations before the engine aborts (0 = unlimited)
    pub max_operations: u64,
    /// Maximum string size in bytes
    pub max_string_size: usize,
    /// Maximum array size
    pub max_array_size: usize,
    /// Maximum object map size
    pub max_map_size: usize,
    /// Maximum expression nesting depth at global level
    pub max_expr_depth: usize,
    /// Maximum expression nesting depth inside functions
    pub max_function_expr_depth: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            max_operations: 100_000,
            max_string_size: 1024 * 1024, // 1MB
            max_array_size: 10_000,
            max_map_size: 10_000,
            max_expr_depth: 25,
            max_function_expr_depth: 10,
        }
    }
}

/// An isolated, single-use script execution environment.
///
/// One sandbox serves exactly one request: the dispatcher creates it,
/// applies the bootstrap, installs capabilities, runs the user script, and
/// drops it. Nothing survives across requests and no sandbox is ever shared
/// between tasks.
#[derive(Debug)]
pub struct Sandbox {
    engine: Engine,
    scope: Scope<'static>,
}

impl Sandbox {
    /// Create a hardened sandbox.
    ///
    /// Hardening is subtractive and happens before any script runs: the
    /// limits from `limits` are applied and the `eval` builtin is disabled
    /// so scripts cannot smuggle in source text that bypasses compilation.
    /// Rhai has no ambient io/os/debug facilities; anything beyond pure
    /// computation must be installed explicitly as a [`Capability`].
    pub fn new(limits: &SandboxLimits) -> Self {
        let mut engine = Engine::new();
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
        engine.set_max_operations(limits.max_operations);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);
        engine.disable_symbol("eval");

        Self {
            engine,
            scope: Scope::new(),
        }
    }

    /// Install a host capability under `name`.
    pub fn install(&mut self, name: &str, capability: Capability) {
        trace!(capability = name, "installing capability");
        match capability {
            Capability::Nullary(f) => {
                self.engine.register_fn(name, move || f());
            }
            Capability::Unary(f) => {
                self.engine.register_fn(name, move |value: Dynamic| f(value));
            }
        }
    }

    /// Install every capability in `set`.
    pub fn install_all(&mut self, set: &CapabilitySet) {
        for (name, capability) in set.iter() {
            self.install(name, capability.clone());
        }
    }

    /// Compile source text against this sandbox's engine settings.
    pub fn compile(&self, source: &str) -> Result<AST> {
        Ok(self.engine.compile(source)?)
    }

    /// Evaluate source text, returning the script's final value.
    ///
    /// Compilation happens separately from execution so parse failures are
    /// reported as compilation errors. Variables and constants the script
    /// defines stay in the sandbox's scope and remain visible to later
    /// evaluations in the same sandbox.
    pub fn eval(&mut self, source: &str) -> Result<Dynamic> {
        let ast = self.compile(source)?;
        self.eval_ast(&ast)
    }

    /// Evaluate a pre-compiled AST in this sandbox.
    pub fn eval_ast(&mut self, ast: &AST) -> Result<Dynamic> {
        Ok(self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut self.scope, ast)?)
    }
}
