//! mk-emulator: MK scales device emulator
//!
//! Listens on TCP and answers get-weight / get-device-id requests with the
//! configured device profile. One request per connection.

use std::sync::Arc;

use anyhow::Context;
use mkscales::{Config, TcpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let profile = config.profile;
    info!(
        listen = %config.listen,
        read_limit = config.read_limit,
        request_width = %config.request_width,
        response_width = %config.response_width,
        checksum_init = format!("0x{:04X}", config.checksum_init),
        serial = profile.identity().serial_str(),
        weight = profile.weight_reading().weight,
        "Starting MK scales emulator"
    );

    let server = TcpServer::bind(&config.listen, Arc::new(config.emulator()))
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?
        .with_read_limit(config.read_limit);

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("Emulator stopped");
    Ok(())
}
