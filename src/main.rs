//! ftpctl - Entry Point
//!
//! Serves a local directory over the FTP control-connection engine.

use log::{error, info, warn};
use std::sync::Arc;

use ftpctl_engine::{FtpServer, LocalBackend, ServerConfig};

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching FTP server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = std::fs::create_dir_all(config.server_root_path()) {
        warn!("Failed to create server root directory: {}", e);
    } else {
        info!("Server root directory: {}", config.server_root);
    }

    if config.users.is_empty() {
        warn!("No users configured; every login will be refused");
    }

    let backend = Arc::new(LocalBackend::new(
        config.server_root_path(),
        config.users.clone(),
    ));

    let server = match FtpServer::create(&config, backend).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }

    info!("Shutting down");
    server.destroy().await;
}
