use std::fmt;
use std::path::Path;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use crate::common::inference_device::InferenceDevice;
use crate::data::DetectorConfig;
use crate::detection_runners::image_ops::LetterboxPolicy;

/// Detector settings as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub weights_path: String,
    pub ort_lib_path: String,
    pub labels_path: Option<String>,
    pub inference_device: InferenceDevice,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub width: u32,
    pub height: u32,
    pub dynamic_input: bool,
    pub letterbox: LetterboxPolicy,
    pub num_dry_run: usize,
    pub profile: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let d = DetectorConfig::default();
        Self {
            weights_path: String::new(),
            ort_lib_path: String::new(),
            labels_path: None,
            inference_device: d.device,
            conf_threshold: d.confidence,
            iou_threshold: d.iou,
            width: d.model_width,
            height: d.model_height,
            dynamic_input: d.dynamic_input,
            letterbox: d.letterbox,
            num_dry_run: d.num_dry_run,
            profile: d.profile,
        }
    }
}

impl ModelConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read model config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid model config {}", path.display()))
    }

    pub fn get_threshold(&self) -> f32 {
        self.conf_threshold
    }

    pub fn to_detector_config(&self) -> DetectorConfig {
        let mut config = DetectorConfig::new()
            .with_model(&self.weights_path)
            .with_ort_lib_path(&self.ort_lib_path)
            .with_device(self.inference_device)
            .with_model_width(self.width)
            .with_model_height(self.height)
            .with_dynamic_input(self.dynamic_input)
            .with_confidence(self.conf_threshold)
            .with_iou(self.iou_threshold)
            .with_letterbox(self.letterbox)
            .with_dry_run(self.num_dry_run)
            .with_profile(self.profile);
        if let Some(path) = &self.labels_path {
            config = config.with_labels_path(path);
        }
        config
    }
}

impl From<&ModelConfig> for DetectorConfig {
    fn from(value: &ModelConfig) -> Self {
        value.to_detector_config()
    }
}

impl fmt::Display for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Weights File Path: {}\n\
            Labels Path: {}\n\
            OnnxRuntime Lib Path: {}\n\
            Inference Device: {}\n\
            Model Input Resolution: {}x{}{}\n\
            Letterbox: {:?}\n\
            Detection Threshold: {} | NMS IoU: {}",
            self.weights_path,
            self.labels_path.as_deref().unwrap_or("<none>"),
            self.ort_lib_path,
            self.inference_device,
            self.width,
            self.height,
            if self.dynamic_input { " (dynamic)" } else { "" },
            self.letterbox,
            self.conf_threshold,
            self.iou_threshold,
        )
    }
}
