//! sdapi-worker - a serverless worker that fronts a local Stable Diffusion WebUI.
//!
//! Each job names a WebUI generation route (`txt2img` or `img2img`) and a
//! checkpoint. The worker injects generation defaults, forwards the job to
//! the WebUI with bounded retry, optionally face-swaps every generated image
//! through the ReActor extension, and hands the JSON result back to the host.
//!
//! # Architecture
//!
//! - `clients`: retrying HTTP transport, readiness gate, generation and face-swap clients
//! - `worker`: request augmentation and the per-job handler
//! - `core`: configuration and wire models
//!
//! # Example
//!
//! ```no_run
//! use sdapi_worker::core::config::AppConfig;
//! use sdapi_worker::worker::Worker;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     sdapi_worker::setup_logging();
//!
//!     let config = AppConfig::from_env()?;
//!     let worker = Worker::new(&config)?;
//!
//!     let result = worker
//!         .handle(serde_json::json!({
//!             "input": {
//!                 "endpoint": "txt2img",
//!                 "model": "sdxl_base.safetensors",
//!                 "prompt": "a lighthouse at dusk"
//!             }
//!         }))
//!         .await?;
//!     println!("{} images", result["images"].as_array().map_or(0, Vec::len));
//!     Ok(())
//! }
//! ```

pub mod clients;
pub mod core;
pub mod errors;
pub mod worker;

/// Configure structured logging with JSON format for serverless log capture.
///
/// Safe to call more than once; only the first call installs the subscriber.
///
/// # Example
///
/// ```
/// sdapi_worker::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
