use std::env;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::errors::WorkerError;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_READY_PATH: &str = "/sdapi/v1/txt2img";
const DEFAULT_FACESWAP_PATH: &str = "/reactor/image";

/// How the generation transport retries transient failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub backoff_factor: Duration,
    pub max_backoff: Duration,
    pub status_forcelist: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            backoff_factor: Duration::from_millis(100),
            max_backoff: Duration::from_secs(120),
            status_forcelist: vec![502, 503, 504],
        }
    }
}

/// How the startup gate polls the image service. `max_attempts: None` polls forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(200),
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: Url,
    pub ready_path: String,
    pub faceswap_path: String,
    pub generation_timeout: Duration,
    pub retry: RetryPolicy,
    pub readiness: ReadinessPolicy,
    pub include_diagnostics: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            ready_path: DEFAULT_READY_PATH.to_string(),
            faceswap_path: DEFAULT_FACESWAP_PATH.to_string(),
            generation_timeout: Duration::from_secs(600),
            retry: RetryPolicy::default(),
            readiness: ReadinessPolicy::default(),
            include_diagnostics: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, WorkerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WorkerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("WEBUI_BASE_URL") {
            config.base_url = Url::parse(raw.trim())
                .map_err(|e| WorkerError::Config(format!("WEBUI_BASE_URL: {e}")))?;
        }
        if let Some(path) = lookup("WEBUI_READY_PATH") {
            config.ready_path = path;
        }
        if let Some(path) = lookup("FACESWAP_PATH") {
            config.faceswap_path = path;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "GENERATION_TIMEOUT_SECS")? {
            config.generation_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_var::<usize>(&lookup, "GENERATION_MAX_RETRIES")? {
            config.retry.max_retries = retries;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "GENERATION_BACKOFF_MS")? {
            config.retry.backoff_factor = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "READINESS_INTERVAL_MS")? {
            config.readiness.interval = Duration::from_millis(ms);
        }
        if let Some(attempts) = parse_var::<u32>(&lookup, "READINESS_MAX_ATTEMPTS")? {
            config.readiness.max_attempts = Some(attempts);
        }
        if let Some(flag) = parse_var::<bool>(&lookup, "INCLUDE_DIAGNOSTICS")? {
            config.include_diagnostics = flag;
        }

        Ok(config)
    }

    pub fn ready_url(&self) -> Result<Url, WorkerError> {
        Ok(self.base_url.join(&self.ready_path)?)
    }

    pub fn faceswap_url(&self) -> Result<Url, WorkerError> {
        Ok(self.base_url.join(&self.faceswap_path)?)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, WorkerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| WorkerError::Config(format!("{key}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_local_webui() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(
            config.ready_url().unwrap().as_str(),
            "http://127.0.0.1:3000/sdapi/v1/txt2img"
        );
        assert_eq!(
            config.faceswap_url().unwrap().as_str(),
            "http://127.0.0.1:3000/reactor/image"
        );
        assert_eq!(config.generation_timeout, Duration::from_secs(600));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.readiness.max_attempts, None);
        assert!(!config.include_diagnostics);
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("WEBUI_BASE_URL", "http://10.0.0.5:7860"),
            ("GENERATION_MAX_RETRIES", "3"),
            ("READINESS_MAX_ATTEMPTS", "50"),
            ("READINESS_INTERVAL_MS", "25"),
            ("INCLUDE_DIAGNOSTICS", "true"),
        ]))
        .unwrap();

        assert_eq!(config.base_url.as_str(), "http://10.0.0.5:7860/");
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.readiness.max_attempts, Some(50));
        assert_eq!(config.readiness.interval, Duration::from_millis(25));
        assert!(config.include_diagnostics);
    }

    #[test]
    fn malformed_number_is_a_config_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("GENERATION_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, WorkerError::Config(ref m) if m.contains("GENERATION_TIMEOUT_SECS")));
    }

    #[test]
    fn blank_values_keep_defaults() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("READINESS_MAX_ATTEMPTS", "  ")])).unwrap();
        assert_eq!(config.readiness.max_attempts, None);
    }
}
