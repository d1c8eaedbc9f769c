//! Server configuration
//!
//! YAML configuration with environment-variable expansion (`${VAR}` and
//! `${VAR:-default}`) and validation. Everything here is read once at
//! startup; nothing is mutated while serving.

use regex::Regex;
use scriptgate_core::{Error, Result};
use scriptgate_engine::{BootstrapConfig, SandboxLimits};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds.
    pub listen: SocketAddr,
    /// Bootstrap applied to every sandbox before the user script.
    pub bootstrap: BootstrapConfig,
    /// Resource limits applied to every sandbox.
    pub limits: SandboxLimits,
    /// Wall-clock deadline for one script execution, in milliseconds.
    /// 0 disables the deadline (the operation limit still applies).
    pub execution_timeout_ms: u64,
    /// Run a probe script through a throwaway sandbox during startup and
    /// abort startup when it fails.
    pub startup_self_test: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".parse().expect("valid default address"),
            bootstrap: BootstrapConfig::default(),
            limits: SandboxLimits::default(),
            execution_timeout_ms: 5_000,
            startup_self_test: false,
        }
    }
}

impl ServerConfig {
    /// Execution deadline as a duration; `None` when disabled.
    pub fn execution_timeout(&self) -> Option<Duration> {
        if self.execution_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.execution_timeout_ms))
        }
    }
}

/// Load configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServerConfig> {
    let path = path.as_ref();

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    load_from_str(&content)
}

/// Load configuration from a YAML string.
pub fn load_from_str(content: &str) -> Result<ServerConfig> {
    let expanded = expand_env_vars(content)?;

    let config: ServerConfig = serde_yaml::from_str(&expanded)
        .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;

    validate_config(&config)?;
    Ok(config)
}

/// Expand environment variables in configuration content.
/// Supports syntax: ${VAR} and ${VAR:-default}
fn expand_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}")
        .map_err(|e| Error::Config(format!("Invalid regex: {e}")))?;

    let mut result = String::new();
    let mut last_match = 0;

    for cap in re.captures_iter(content) {
        let full_match = cap.get(0).expect("capture 0 always present");
        let var_name = cap.get(1).expect("variable name group").as_str();
        let default_value = cap.get(3).map(|m| m.as_str());

        let value = match env::var(var_name) {
            Ok(val) => val,
            Err(_) => match default_value {
                Some(default) => default.to_string(),
                None => {
                    return Err(Error::Config(format!(
                        "Environment variable '{var_name}' not set and no default provided"
                    )));
                }
            },
        };

        result.push_str(&content[last_match..full_match.start()]);
        result.push_str(&value);
        last_match = full_match.end();
    }

    result.push_str(&content[last_match..]);
    Ok(result)
}

/// Validate a configuration.
pub fn validate_config(config: &ServerConfig) -> Result<()> {
    if let Some(file) = &config.bootstrap.file {
        if !file.is_file() {
            return Err(Error::Config(format!(
                "Bootstrap file not found: {}",
                file.display()
            )));
        }
    }

    if config.limits.max_string_size == 0 {
        return Err(Error::Config(
            "limits.max_string_size must be greater than zero".to_string(),
        ));
    }

    Ok(())
}
