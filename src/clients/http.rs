//! HTTP transport shared by all outbound calls.
//!
//! `RetryingClient` owns one `reqwest::Client` (and so one connection pool)
//! for the life of the process. Requests sent through [`RetryingClient::post_json`]
//! are retried on transient WebUI failures; everything else goes out once.

use std::iter;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::warn;
use url::Url;

pub use crate::core::config::RetryPolicy;
use crate::errors::WorkerError;

impl RetryPolicy {
    /// Sleep before each retry: immediate, then `factor * 2^(n-1)`, capped.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let factor_ms = u64::try_from(self.backoff_factor.as_millis()).unwrap_or(u64::MAX);
        iter::once(Duration::ZERO)
            .chain(
                ExponentialBackoff::from_millis(2)
                    .factor(factor_ms)
                    .max_delay(self.max_backoff),
            )
            .take(self.max_retries)
    }

    #[must_use]
    pub fn retries_status(&self, status: StatusCode) -> bool {
        self.status_forcelist.contains(&status.as_u16())
    }
}

#[derive(Debug)]
enum AttemptError {
    Status(StatusCode),
    Connect(reqwest::Error),
    Fatal(reqwest::Error),
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        matches!(self, AttemptError::Status(_) | AttemptError::Connect(_))
    }
}

#[derive(Debug, Clone)]
pub struct RetryingClient {
    inner: Client,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(policy: RetryPolicy) -> Result<Self, WorkerError> {
        let inner = Client::builder()
            .build()
            .map_err(|e| WorkerError::Http(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(inner, policy))
    }

    #[must_use]
    pub fn with_client(inner: Client, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The pooled client without the retry wrapper.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.inner
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// POSTs `body` as JSON, retrying on the policy's status codes and on
    /// connection failures. Any other status is handed back untouched.
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::Http` when the body cannot be sent, or when every
    /// retry was spent on a transient failure.
    pub async fn post_json<T>(
        &self,
        url: &Url,
        body: &T,
        timeout: Option<Duration>,
    ) -> Result<Response, WorkerError>
    where
        T: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec(body)?;
        let mut attempt = 0usize;

        let action = || {
            attempt += 1;
            let current = attempt;
            let mut request = self
                .inner
                .post(url.clone())
                .header(CONTENT_TYPE, "application/json")
                .header(ACCEPT, "application/json")
                .body(bytes.clone());
            if let Some(limit) = timeout {
                request = request.timeout(limit);
            }

            async move {
                match request.send().await {
                    Ok(response) if self.policy.retries_status(response.status()) => {
                        warn!(attempt = current, status = %response.status(), url = %url, "Transient upstream status");
                        Err(AttemptError::Status(response.status()))
                    }
                    Ok(response) => Ok(response),
                    Err(e) if e.is_connect() => {
                        warn!(attempt = current, url = %url, "Connection failed: {}", e);
                        Err(AttemptError::Connect(e))
                    }
                    Err(e) => Err(AttemptError::Fatal(e)),
                }
            }
        };

        RetryIf::spawn(self.policy.delays(), action, AttemptError::is_retryable)
            .await
            .map_err(|e| match e {
                AttemptError::Status(status) => WorkerError::Http(format!(
                    "{url} still returned {status} after {} retries",
                    self.policy.max_retries
                )),
                AttemptError::Connect(e) => WorkerError::Http(format!(
                    "{url} unreachable after {} retries: {e}",
                    self.policy.max_retries
                )),
                AttemptError::Fatal(e) => WorkerError::from(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_matches_factor_backoff() {
        let delays: Vec<Duration> = RetryPolicy::default().delays().collect();
        assert_eq!(delays.len(), 10);
        assert_eq!(delays[0], Duration::ZERO);
        assert_eq!(delays[1], Duration::from_millis(200));
        assert_eq!(delays[2], Duration::from_millis(400));
        assert_eq!(delays[3], Duration::from_millis(800));
        assert_eq!(delays[9], Duration::from_millis(51_200));
    }

    #[test]
    fn delays_are_capped() {
        let policy = RetryPolicy {
            max_retries: 20,
            max_backoff: Duration::from_secs(1),
            ..RetryPolicy::default()
        };
        assert!(policy.delays().all(|d| d <= Duration::from_secs(1)));
    }

    #[test]
    fn only_gateway_statuses_are_retried() {
        let policy = RetryPolicy::default();
        assert!(policy.retries_status(StatusCode::BAD_GATEWAY));
        assert!(policy.retries_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(policy.retries_status(StatusCode::GATEWAY_TIMEOUT));
        assert!(!policy.retries_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!policy.retries_status(StatusCode::UNPROCESSABLE_ENTITY));
    }

    #[test]
    fn zero_retries_yields_no_delays() {
        let policy = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delays().count(), 0);
    }
}
