//! ReActor face-swap post-processing.
//!
//! Each generated image is sent to the face-swap route together with the
//! caller's source face, one at a time and in order. A failure stops the
//! pass: images already swapped stay swapped, the rest keep the original
//! generation output.

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{error, info};
use url::Url;

use crate::core::models::{FaceSwapReport, FaceSwapRequest, FaceSwapResponse, GenerationResponse};
use crate::errors::WorkerError;

pub struct FaceSwapClient {
    http: Client,
    url: Url,
}

impl FaceSwapClient {
    #[must_use]
    pub fn new(http: Client, url: Url) -> Self {
        Self { http, url }
    }

    /// Swaps `source` onto `target` and returns the new base64 image.
    pub async fn swap(&self, source: &str, target: &str) -> Result<String, WorkerError> {
        let request = FaceSwapRequest::new(source, target);
        let response = self
            .http
            .post(self.url.clone())
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .await?;

        let body: FaceSwapResponse = response.json().await.map_err(|e| {
            WorkerError::Parse(format!("face swap response has no usable image: {e}"))
        })?;
        Ok(body.image)
    }

    /// Replaces every image of `response` in place with its face-swapped version.
    ///
    /// Never fails: errors are logged and reported through the returned
    /// [`FaceSwapReport`]. The number and order of images never change.
    pub async fn apply(&self, response: &mut GenerationResponse, source: &str) -> FaceSwapReport {
        let Some(images) = response.images_mut() else {
            error!("Generation response has no images array; skipping face swap");
            return FaceSwapReport {
                error: Some("generation response has no images array".to_string()),
                ..FaceSwapReport::default()
            };
        };

        let mut report = FaceSwapReport {
            total: images.len(),
            ..FaceSwapReport::default()
        };

        for (index, slot) in images.iter_mut().enumerate() {
            let result = match slot.as_str() {
                Some(target) => self.swap(source, target).await,
                None => Err(WorkerError::Parse("image is not a base64 string".to_string())),
            };

            match result {
                Ok(swapped) => {
                    *slot = Value::String(swapped);
                    report.replaced += 1;
                }
                Err(e) => {
                    let e = WorkerError::FaceSwap {
                        index,
                        message: e.to_string(),
                    };
                    error!("Error during face-swapping: {}", e);
                    report.error = Some(e.to_string());
                    break;
                }
            }
        }

        info!(
            replaced = report.replaced,
            total = report.total,
            "Face swap pass finished"
        );
        report
    }
}
