//! Scriptgate CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use scriptgate_server::{
    load_config, NamespaceHandlers, ServerBuilder, ServerConfig, DEFAULT_NAMESPACE,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scriptgate")]
#[command(about = "Sandboxed scripting runtime over HTTP", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve {
        /// Path to configuration file; defaults are used when absent
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Log level (trace, debug, info, warn, error)
        #[arg(short, long, default_value = "info")]
        log_level: String,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, log_level } => {
            init_tracing(&log_level)?;

            tracing::info!("Starting Scriptgate");

            let config = match config {
                Some(path) => {
                    tracing::info!("Config file: {}", path.display());
                    load_config(path)?
                }
                None => {
                    tracing::info!("No config file given, using defaults");
                    ServerConfig::default()
                }
            };

            tracing::info!(
                listen = %config.listen,
                timeout_ms = config.execution_timeout_ms,
                "Configuration loaded"
            );

            // The binary serves the default namespace with a plain script
            // runner; embedders register richer namespaces through the
            // library API.
            let server = ServerBuilder::new()
                .config(config)
                .namespace(DEFAULT_NAMESPACE, NamespaceHandlers::script_runner())
                .build()?;

            server.run().await?;
            Ok(())
        }

        Commands::Validate { config } => {
            tracing_subscriber::fmt().with_target(false).init();

            tracing::info!("Validating configuration: {}", config.display());

            match load_config(&config) {
                Ok(cfg) => {
                    tracing::info!("✓ Configuration is valid");
                    tracing::info!("  Listen: {}", cfg.listen);
                    tracing::info!("  Execution timeout: {}ms", cfg.execution_timeout_ms);
                    tracing::info!(
                        "  Bootstrap: {}",
                        match (&cfg.bootstrap.file, &cfg.bootstrap.script) {
                            (Some(path), _) => format!("file {}", path.display()),
                            (None, Some(_)) => "inline".to_string(),
                            (None, None) => "none".to_string(),
                        }
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("✗ Configuration validation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("Scriptgate");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true),
        )
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(filter.into()),
        )
        .init();

    Ok(())
}
