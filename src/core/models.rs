use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::WorkerError;

/// Checkpoint used when the full override block cannot be built.
pub const FALLBACK_CHECKPOINT: &str = "model_indoor.safetensors";

/// Image-generation operations the WebUI exposes under `/sdapi/v1/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Txt2Img,
    Img2Img,
}

impl Endpoint {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::Txt2Img => "txt2img",
            Endpoint::Img2Img => "img2img",
        }
    }

    #[must_use]
    pub fn api_path(self) -> String {
        format!("/sdapi/v1/{}", self.as_str())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "txt2img" => Ok(Endpoint::Txt2Img),
            "img2img" => Ok(Endpoint::Img2Img),
            other => Err(WorkerError::UnsupportedEndpoint(other.to_string())),
        }
    }
}

/// The caller's `input` object. Kept as an open map so every generation
/// parameter reaches the WebUI untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobPayload(pub Map<String, Value>);

impl JobPayload {
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.0.get("endpoint").and_then(Value::as_str)
    }

    #[must_use]
    pub fn model(&self) -> Option<&Value> {
        self.0.get("model")
    }

    /// Source face for post-processing; only a string counts as present.
    #[must_use]
    pub fn roop_img(&self) -> Option<&str> {
        self.0.get("roop_img").and_then(Value::as_str)
    }

    #[must_use]
    pub fn has_roop_field(&self) -> bool {
        self.0.contains_key("roop_img")
    }

    pub fn set_override_settings(&mut self, settings: Value) {
        self.0.insert("override_settings".to_string(), settings);
    }

    #[must_use]
    pub fn override_settings(&self) -> Option<&Value> {
        self.0.get("override_settings")
    }
}

impl TryFrom<Value> for JobPayload {
    type Error = WorkerError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(JobPayload(map)),
            other => Err(WorkerError::Parse(format!(
                "job input must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefinerSettings {
    pub model: String,
    pub switch_at: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ControlNetUnit {
    pub enabled: bool,
    pub control_type: &'static str,
    pub control_weight: u32,
    pub start_control_step: u32,
    pub end_control_step: u32,
    pub control_mode: &'static str,
    pub batch_option: &'static str,
}

impl Default for ControlNetUnit {
    fn default() -> Self {
        Self {
            enabled: true,
            control_type: "all",
            control_weight: 1,
            start_control_step: 0,
            end_control_step: 1,
            control_mode: "balanced",
            batch_option: "all_units_for_all_images",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ControlNetSettings {
    pub unit_0: ControlNetUnit,
}

/// Generation defaults injected as `override_settings`.
#[derive(Debug, Clone, Serialize)]
pub struct OverrideSettings {
    pub sd_model_checkpoint: String,
    pub sampling_method: &'static str,
    pub scheduler: &'static str,
    pub steps: u32,
    pub refiner: RefinerSettings,
    pub resize_mode: &'static str,
    pub cfg_scale: u32,
    pub strength: f64,
    pub seed: u32,
    pub controlnet: ControlNetSettings,
}

impl OverrideSettings {
    #[must_use]
    pub fn for_model(model: &str, seed: u32) -> Self {
        Self {
            sd_model_checkpoint: model.to_string(),
            sampling_method: "DPM++ 2M",
            scheduler: "karras",
            steps: 50,
            refiner: RefinerSettings {
                model: model.to_string(),
                switch_at: 0.8,
            },
            resize_mode: "auto",
            cfg_scale: 25,
            strength: 0.5,
            seed,
            controlnet: ControlNetSettings::default(),
        }
    }

    /// The minimal block used when the full one cannot be built.
    #[must_use]
    pub fn fallback() -> Value {
        serde_json::json!({ "sd_model_checkpoint": FALLBACK_CHECKPOINT })
    }
}

/// Body sent to the ReActor face-swap route for one target image.
#[derive(Debug, Clone, Serialize)]
pub struct FaceSwapRequest<'a> {
    pub source_image: &'a str,
    pub target_image: &'a str,
    pub source_faces_index: [u32; 1],
    pub face_index: [u32; 1],
    pub upscaler: &'static str,
    pub scale: u32,
    pub upscale_visibility: u32,
    pub face_restorer: &'static str,
    pub restorer_visibility: u32,
    pub restore_first: u32,
    pub model: &'static str,
    pub gender_source: u32,
    pub gender_target: u32,
    pub save_to_file: u32,
    pub result_file_path: &'static str,
}

impl<'a> FaceSwapRequest<'a> {
    #[must_use]
    pub fn new(source_image: &'a str, target_image: &'a str) -> Self {
        Self {
            source_image,
            target_image,
            source_faces_index: [0],
            face_index: [0],
            upscaler: "4x_Struzan_300000",
            scale: 2,
            upscale_visibility: 1,
            face_restorer: "CodeFormer",
            restorer_visibility: 1,
            restore_first: 1,
            model: "inswapper_128.onnx",
            gender_source: 0,
            gender_target: 0,
            save_to_file: 0,
            result_file_path: "",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FaceSwapResponse {
    pub image: String,
}

/// Raw WebUI response. Whatever JSON the service returned is preserved;
/// only the `images` array is ever touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationResponse(pub Value);

impl GenerationResponse {
    #[must_use]
    pub fn images(&self) -> Option<&Vec<Value>> {
        self.0.get("images").and_then(Value::as_array)
    }

    pub fn images_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.0.get_mut("images").and_then(Value::as_array_mut)
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FaceSwapReport {
    pub replaced: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FaceSwapReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.replaced == self.total
    }
}

/// What was silently degraded while serving a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_fallback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faceswap: Option<FaceSwapReport>,
}

impl Diagnostics {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.override_fallback.is_none()
            && self.faceswap.as_ref().is_none_or(FaceSwapReport::is_complete)
    }
}

#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub response: GenerationResponse,
    pub diagnostics: Diagnostics,
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
