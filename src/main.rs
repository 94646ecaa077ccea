//! Seismic event recorder utility

use std::time::Duration;

use sismo_recorder::config::AppConfig;
use sismo_recorder::errors::RecorderError;
use sismo_recorder::fetch::HttpEventSource;
use sismo_recorder::store::DynamoDbStore;
use sismo_recorder::task::IngestTask;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), RecorderError> {
    // Initialize logging with more configuration
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration, preferring environment variables and config files
    let config = AppConfig::load()?;
    config.validate()?;

    let source = HttpEventSource::new(config.upstream)?;
    let mode = config.store.mode;
    let store = DynamoDbStore::connect(config.store).await;
    let task = IngestTask::new(source, store, mode, config.task.missing_time);

    match config.task.interval {
        // Scheduled mode: run on a fixed interval until shutdown
        Some(interval) => {
            let shutdown_signal = signal::ctrl_c();
            tokio::select! {
                _ = run_scheduled(&task, interval) => {}
                _ = shutdown_signal => {
                    info!("Received shutdown signal");
                }
            }
        }
        // One-shot mode: run once and print the handler-shaped response
        None => {
            let response = task.run().await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

async fn run_scheduled(task: &IngestTask<HttpEventSource, DynamoDbStore>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        task.run().await;
    }
}
