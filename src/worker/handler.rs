use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use super::augment::augment;
use crate::clients::{FaceSwapClient, GenerationClient, RetryingClient};
use crate::core::config::AppConfig;
use crate::core::models::{Diagnostics, JobOutcome, JobPayload, json_kind};
use crate::errors::WorkerError;

/// Long-lived per-process state: the pooled clients and output options.
pub struct Worker {
    generation: GenerationClient,
    faceswap: FaceSwapClient,
    include_diagnostics: bool,
}

impl Worker {
    pub fn new(config: &AppConfig) -> Result<Self, WorkerError> {
        let http = RetryingClient::new(config.retry.clone())?;
        let faceswap = FaceSwapClient::new(http.client().clone(), config.faceswap_url()?);
        let generation =
            GenerationClient::new(http, config.base_url.clone(), config.generation_timeout);

        Ok(Self::from_parts(generation, faceswap, config.include_diagnostics))
    }

    #[must_use]
    pub fn from_parts(
        generation: GenerationClient,
        faceswap: FaceSwapClient,
        include_diagnostics: bool,
    ) -> Self {
        Self {
            generation,
            faceswap,
            include_diagnostics,
        }
    }

    #[must_use]
    pub fn http_client(&self) -> &reqwest::Client {
        self.generation.http().client()
    }

    /// Augment, generate, then face-swap when the job carries a source face.
    ///
    /// # Errors
    ///
    /// `UnsupportedEndpoint` for non-generation jobs, otherwise whatever the
    /// generation call failed with. Face-swap problems never fail the job.
    pub async fn process(&self, mut payload: JobPayload) -> Result<JobOutcome, WorkerError> {
        let endpoint = match payload.0.get("endpoint") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => return Err(WorkerError::UnsupportedEndpoint(other.to_string())),
            None => return Err(WorkerError::Parse("job input has no 'endpoint'".to_string())),
        };

        let override_fallback = augment(&mut payload, &mut rand::thread_rng());
        let mut diagnostics = Diagnostics {
            override_fallback,
            ..Diagnostics::default()
        };

        let mut response = self.generation.generate(&endpoint, &payload).await?;

        match payload.roop_img() {
            Some(source) => {
                diagnostics.faceswap = Some(self.faceswap.apply(&mut response, source).await);
            }
            None if payload.has_roop_field() => {
                warn!("'roop_img' is not a string; skipping face swap");
            }
            None => {}
        }

        Ok(JobOutcome {
            response,
            diagnostics,
        })
    }

    /// Runs one host job (`{"input": {...}}`) and builds the value handed back to the caller.
    ///
    /// # Errors
    ///
    /// Fails when the job has no usable `input` or generation fails outright.
    pub async fn handle(&self, job: Value) -> Result<Value, WorkerError> {
        let input = match job {
            Value::Object(mut map) => map
                .remove("input")
                .ok_or_else(|| WorkerError::Parse("job has no 'input'".to_string()))?,
            other => {
                return Err(WorkerError::Parse(format!(
                    "job must be an object, got {}",
                    json_kind(&other)
                )));
            }
        };
        let payload = JobPayload::try_from(input)?;

        match self.process(payload).await {
            Ok(outcome) => Ok(self.render(outcome)),
            Err(WorkerError::UnsupportedEndpoint(endpoint)) => {
                warn!(endpoint = %endpoint, "Unsupported endpoint");
                Ok(unsupported_operation(&endpoint))
            }
            Err(e) => Err(e),
        }
    }

    fn render(&self, outcome: JobOutcome) -> Value {
        let JobOutcome {
            response,
            diagnostics,
        } = outcome;

        if diagnostics.is_clean() {
            info!("Job completed");
        } else {
            warn!(diagnostics = ?diagnostics, "Job completed with degraded output");
        }

        let mut value = response.into_value();
        if self.include_diagnostics {
            if let Value::Object(map) = &mut value {
                map.insert("_diagnostics".to_string(), json!(diagnostics));
            }
        }
        value
    }
}

/// Structured body returned for jobs that name no generation route.
#[must_use]
pub fn unsupported_operation(endpoint: &str) -> Value {
    json!({
        "error": {
            "kind": "unsupported_operation",
            "endpoint": endpoint
        }
    })
}

/// Host entry point for one job.
#[tracing::instrument(level = "info", skip(worker, event), fields(request_id = %event.context.request_id))]
pub async fn function_handler(worker: &Worker, event: LambdaEvent<Value>) -> Result<Value, Error> {
    #[cfg(feature = "debug-logs")]
    info!("Worker received job: {:?}", event.payload);

    worker.handle(event.payload).await.map_err(|e| {
        error!("Job failed: {}", e);
        Error::from(e)
    })
}

pub use self::function_handler as handler;
