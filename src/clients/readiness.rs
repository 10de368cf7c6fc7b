//! Startup gate that blocks until the WebUI accepts connections.

use std::future::Future;

use reqwest::Client;
use tracing::{info, warn};
use url::Url;

pub use crate::core::config::ReadinessPolicy;
use crate::errors::WorkerError;

/// Polls `url` until a GET completes. Any status code, including errors,
/// counts as ready; only a failure to get a response at all is retried.
///
/// Returns the number of attempts made.
///
/// # Errors
///
/// Only fails when `policy.max_attempts` is set and is exhausted.
pub async fn wait_for_service(
    client: &Client,
    url: &Url,
    policy: &ReadinessPolicy,
) -> Result<u32, WorkerError> {
    let attempts = wait_until_ready(policy, || async {
        client.get(url.clone()).send().await.map(|_| ())
    })
    .await?;
    info!(url = %url, attempts, "Image service is ready");
    Ok(attempts)
}

/// Drives `probe` until it succeeds, sleeping `policy.interval` between tries.
pub async fn wait_until_ready<F, Fut, E>(policy: &ReadinessPolicy, mut probe: F) -> Result<u32, WorkerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let mut attempts = 0u32;
    loop {
        attempts = attempts.saturating_add(1);
        match probe().await {
            Ok(()) => return Ok(attempts),
            Err(e) => warn!(attempt = attempts, "Service not ready yet. Retrying... ({})", e),
        }

        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(WorkerError::ServiceUnavailable { attempts });
        }

        tokio::time::sleep(policy.interval).await;
    }
}
