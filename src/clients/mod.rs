//! Outbound HTTP clients for the local WebUI.

pub mod faceswap;
pub mod generation;
pub mod http;
pub mod readiness;

pub use faceswap::FaceSwapClient;
pub use generation::GenerationClient;
pub use http::RetryingClient;
pub use readiness::wait_for_service;
