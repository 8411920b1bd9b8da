//! Deeprun Main Entry Point
//!
//! This is the main binary for the deeprun game middleware. It runs pending
//! database migrations and keeps the chain event indexer polling until the
//! process receives an interrupt.

use deeprun::{Dependencies, ServiceConfig, ServiceError};
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("deeprun=info,deeprun_pipeline=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    dotenv().ok();
    init_tracing();

    info!(
        service_version = env!("CARGO_PKG_VERSION"),
        "starting deeprun"
    );

    let config = ServiceConfig::from_env();
    let dependencies = match Dependencies::new(&config).await {
        Ok(dependencies) => {
            info!("dependencies initialized");
            dependencies
        }
        Err(err) => {
            error!(error = %err, "failed to initialize dependencies");
            return Err(err);
        }
    };

    let indexer = dependencies.indexer.clone();
    let runner = tokio::spawn({
        let indexer = indexer.clone();
        async move { indexer.run_forever().await }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    indexer.stop();
    runner.await?;

    Ok(())
}
