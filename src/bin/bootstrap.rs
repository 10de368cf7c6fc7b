// Serverless bootstrap: gate on the WebUI, then serve jobs.

use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use sdapi_worker::clients::wait_for_service;
use sdapi_worker::core::config::AppConfig;
use sdapi_worker::worker::{Worker, handler};
use serde_json::Value;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    sdapi_worker::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;
    let worker = Arc::new(Worker::new(&config)?);

    wait_for_service(worker.http_client(), &config.ready_url()?, &config.readiness).await?;
    info!("WebUI API Service is ready. Starting worker...");

    run(service_fn(move |event: LambdaEvent<Value>| {
        let worker = Arc::clone(&worker);
        async move { handler(&worker, event).await }
    }))
    .await
}
