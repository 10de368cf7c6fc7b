use sdapi_worker::errors::WorkerError;
use std::error::Error;

#[test]
fn test_worker_error_implements_error_trait() {
    fn assert_error<T: Error + Send + Sync + 'static>(_: &T) {}

    let error = WorkerError::Parse("test error".to_string());
    assert_error(&error);
}

#[test]
fn test_worker_error_display() {
    let error = WorkerError::UnsupportedEndpoint("upscale".to_string());
    assert_eq!(format!("{error}"), "Unsupported endpoint: upscale");

    let error = WorkerError::FaceSwap {
        index: 2,
        message: "timeout".to_string(),
    };
    assert_eq!(format!("{error}"), "Face swap failed for image 2: timeout");

    let error = WorkerError::ServiceUnavailable { attempts: 5 };
    assert_eq!(format!("{error}"), "Service not ready after 5 attempts");
}

#[test]
fn test_worker_error_from_conversions() {
    let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let worker_err: WorkerError = err.into();
    assert!(matches!(worker_err, WorkerError::Parse(_)));

    let err = url::Url::parse("not a url").unwrap_err();
    let worker_err: WorkerError = err.into();
    assert!(matches!(worker_err, WorkerError::Config(_)));

    #[allow(unused)]
    fn _check_reqwest_conversion(err: reqwest::Error) -> WorkerError {
        WorkerError::from(err)
    }
}

#[test]
fn test_worker_error_converts_to_lambda_error() {
    let err: lambda_runtime::Error = WorkerError::Http("down".to_string()).into();
    assert_eq!(err.to_string(), "Failed to send HTTP request: down");
}
