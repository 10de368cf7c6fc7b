//! Injects the generation defaults into an incoming job.

use rand::Rng;
use serde_json::Value;
use tracing::{debug, error};

use crate::core::models::{Endpoint, JobPayload, OverrideSettings, json_kind};
use crate::errors::WorkerError;

/// Adds `override_settings` to generation jobs. Other endpoints pass through.
///
/// If the full block cannot be built the job still goes ahead with only the
/// fallback checkpoint; the cause is returned so it can be reported.
pub fn augment<R: Rng + ?Sized>(payload: &mut JobPayload, rng: &mut R) -> Option<String> {
    let is_generation = payload
        .endpoint()
        .is_some_and(|name| name.parse::<Endpoint>().is_ok());
    if !is_generation {
        return None;
    }

    match build_override_settings(payload, rng) {
        Ok(settings) => {
            debug!(seed = settings["seed"].as_u64(), "Override settings applied");
            payload.set_override_settings(settings);
            None
        }
        Err(e) => {
            error!("Error setting override_settings: {}", e);
            payload.set_override_settings(OverrideSettings::fallback());
            Some(e.to_string())
        }
    }
}

fn build_override_settings<R: Rng + ?Sized>(
    payload: &JobPayload,
    rng: &mut R,
) -> Result<Value, WorkerError> {
    let model = match payload.model() {
        Some(Value::String(model)) => model,
        Some(other) => {
            return Err(WorkerError::OverrideSettings(format!(
                "'model' must be a string, got {}",
                json_kind(other)
            )));
        }
        None => return Err(WorkerError::OverrideSettings("missing 'model'".to_string())),
    };

    let settings = OverrideSettings::for_model(model, rng.r#gen::<u32>());
    Ok(serde_json::to_value(settings)?)
}
