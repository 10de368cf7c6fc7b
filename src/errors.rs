use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to send HTTP request: {0}")]
    Http(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Unsupported endpoint: {0}")]
    UnsupportedEndpoint(String),

    #[error("Face swap failed for image {index}: {message}")]
    FaceSwap { index: usize, message: String },

    #[error("Failed to build override settings: {0}")]
    OverrideSettings(String),

    #[error("Service not ready after {attempts} attempts")]
    ServiceUnavailable { attempts: u32 },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for WorkerError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            WorkerError::Parse(error.to_string())
        } else {
            WorkerError::Http(error.to_string())
        }
    }
}

impl From<serde_json::Error> for WorkerError {
    fn from(error: serde_json::Error) -> Self {
        WorkerError::Parse(error.to_string())
    }
}

impl From<url::ParseError> for WorkerError {
    fn from(error: url::ParseError) -> Self {
        WorkerError::Config(format!("invalid URL: {error}"))
    }
}
