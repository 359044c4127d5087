//! WebSocket relay server.
//!
//! Receives messages from clients and relays them to all other connected clients.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin relay-server -- --port 8080 --path /ws
//! ```

use relay_server::Config;
use relay_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);
    if let Some(path) = &config.config {
        tracing::info!("Loaded config file {}", path.display());
    }

    // Run the server
    if let Err(e) = relay_server::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
