use clap::Parser;
use ricochet::{RicochetError, RicochetServerBuilder, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), RicochetError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::parse();
    config.validate()?;

    let server = RicochetServerBuilder::from_config(&config).build().await?;
    tracing::info!(
        addr = %server.local_addr()?,
        room_expiry_hours = config.room_expiry_hours,
        sweep_interval_secs = config.sweep_interval_secs,
        "starting ricochet-server"
    );

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            Ok(())
        }
    }
}
