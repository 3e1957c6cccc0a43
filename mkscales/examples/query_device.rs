//! Query a running emulator (or device) for its serial and weight

use mkscales::Scales;

#[tokio::main]
async fn main() -> mkscales::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    // Change to your device address
    let host = std::env::var("SCALES_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

    let scales = Scales::new(host, mkscales_core::DEFAULT_PORT);

    let identity = scales.get_device_id().await?;
    println!("Identity: {}", identity);

    let reading = scales.get_weight().await?;
    println!("Reading: {}", reading);

    Ok(())
}
