//! Client for the WebUI generation routes.

use std::time::Duration;

use tracing::{debug, info};
use url::Url;

use super::http::RetryingClient;
use crate::core::models::{Endpoint, GenerationResponse, JobPayload};
use crate::errors::WorkerError;

pub struct GenerationClient {
    http: RetryingClient,
    base_url: Url,
    timeout: Duration,
}

impl GenerationClient {
    #[must_use]
    pub fn new(http: RetryingClient, base_url: Url, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    #[must_use]
    pub fn http(&self) -> &RetryingClient {
        &self.http
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, WorkerError> {
        Ok(self.base_url.join(&endpoint.api_path())?)
    }

    /// Forwards `payload` to the route named by `endpoint`.
    ///
    /// The status code is not inspected beyond the retry policy: a 4xx or 5xx
    /// body comes back as-is.
    ///
    /// # Errors
    ///
    /// `UnsupportedEndpoint` without any network traffic when `endpoint` is not
    /// a generation route; `Http` when retries are exhausted; `Parse` when the
    /// body is not JSON.
    pub async fn generate(
        &self,
        endpoint: &str,
        payload: &JobPayload,
    ) -> Result<GenerationResponse, WorkerError> {
        let endpoint: Endpoint = endpoint.parse()?;
        let url = self.endpoint_url(endpoint)?;

        #[cfg(feature = "debug-logs")]
        debug!("Generation payload: {:?}", payload);

        info!(endpoint = %endpoint, fields = payload.0.len(), "Submitting generation request");
        let response = self.http.post_json(&url, payload, Some(self.timeout)).await?;
        let status = response.status();

        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| WorkerError::Parse(format!("{endpoint} returned non-JSON body (status {status}): {e}")))?;

        debug!(endpoint = %endpoint, status = %status, "Generation response received");
        Ok(GenerationResponse(body))
    }
}
