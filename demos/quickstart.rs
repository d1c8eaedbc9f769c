//! Quickstart demo for Scriptgate
//!
//! Registers the "global" namespace with one native capability, `test()`,
//! and serves on 127.0.0.1:8080.
//!
//! Try it:
//!     cargo run --bin quickstart
//!     curl -s -X POST 127.0.0.1:8080 -d '{"script": "respond(test())"}'
//!
//! You should receive `{"status":200,"body":"Test succeeded!"}`.

use scriptgate_engine::{BootstrapConfig, Capability, CapabilitySet};
use scriptgate_server::{NamespaceHandlers, ServerBuilder, ServerConfig, DEFAULT_NAMESPACE};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig {
        // Seed every sandbox with a constant the scripts can read
        bootstrap: BootstrapConfig::inline(r#"const API_NAME = "scriptgate demo";"#),
        startup_self_test: true,
        ..ServerConfig::default()
    };

    // Every sandbox in this namespace gets `test()`; `respond` answers 200
    // with whatever value the script passes.
    let capabilities =
        CapabilitySet::new().with("test", Capability::nullary(|| "Test succeeded!".into()));

    let server = ServerBuilder::new()
        .config(config)
        .namespace(
            DEFAULT_NAMESPACE,
            NamespaceHandlers::with_capabilities(capabilities),
        )
        .build()?;

    println!("Scriptgate demo listening on {}", server.listen_addr());
    println!(r#"Try: curl -s -X POST 127.0.0.1:8080 -d '{{"script": "respond(test())"}}'"#);

    server.run().await?;
    Ok(())
}
