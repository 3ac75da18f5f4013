//! Options for building a detector.

use crate::common::InferenceDevice;
use crate::detection_runners::image_ops::{LetterboxPolicy, PAD_COLOR};
use crate::detection_runners::nms::{MAX_NMS, MAX_WH};

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub onnx_path: String,
    pub ort_lib_path: String,
    pub device: InferenceDevice,
    pub model_width: u32,
    pub model_height: u32,
    pub dynamic_input: bool,
    pub profile: bool,
    pub num_dry_run: usize,

    pub confidence: f32,
    pub iou: f32,
    pub max_nms: usize,
    pub max_wh: f32,
    pub names: Option<Vec<String>>,
    pub labels_path: Option<String>,

    pub pad_color: [u8; 3],
    pub letterbox: LetterboxPolicy,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            onnx_path: String::new(),
            ort_lib_path: String::new(),
            device: InferenceDevice::CPU,
            model_width: 640,
            model_height: 384,
            dynamic_input: false,
            profile: false,
            num_dry_run: 1,

            confidence: 0.4,
            iou: 0.4,
            max_nms: MAX_NMS,
            max_wh: MAX_WH,
            names: None,
            labels_path: None,

            pad_color: PAD_COLOR,
            letterbox: LetterboxPolicy::Adaptive,
        }
    }
}

impl DetectorConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_model(mut self, onnx_path: &str) -> Self {
        self.onnx_path = onnx_path.to_string();
        self
    }

    /// Path to the ONNX Runtime shared library. Empty means the runtime
    /// is resolved from the environment.
    pub fn with_ort_lib_path(mut self, ort_lib_path: &str) -> Self {
        self.ort_lib_path = ort_lib_path.to_string();
        self
    }

    pub fn with_device(mut self, device: InferenceDevice) -> Self {
        self.device = device;
        self
    }

    pub fn with_model_width(mut self, n: u32) -> Self {
        self.model_width = n;
        self
    }

    pub fn with_model_height(mut self, n: u32) -> Self {
        self.model_height = n;
        self
    }

    /// Treat the spatial input axes as dynamic even when the model fixes them.
    pub fn with_dynamic_input(mut self, x: bool) -> Self {
        self.dynamic_input = x;
        self
    }

    pub fn with_dry_run(mut self, n: usize) -> Self {
        self.num_dry_run = n;
        self
    }

    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_confidence(mut self, x: f32) -> Self {
        self.confidence = x;
        self
    }

    pub fn with_iou(mut self, x: f32) -> Self {
        self.iou = x;
        self
    }

    pub fn with_max_nms(mut self, n: usize) -> Self {
        self.max_nms = n;
        self
    }

    pub fn with_max_wh(mut self, x: f32) -> Self {
        self.max_wh = x;
        self
    }

    pub fn with_names(mut self, names: &[&str]) -> Self {
        self.names = Some(names.iter().map(|x| x.to_string()).collect::<Vec<String>>());
        self
    }

    pub fn with_labels_path(mut self, path: &str) -> Self {
        self.labels_path = Some(path.to_string());
        self
    }

    pub fn with_pad_color(mut self, rgb: [u8; 3]) -> Self {
        self.pad_color = rgb;
        self
    }

    pub fn with_letterbox(mut self, policy: LetterboxPolicy) -> Self {
        self.letterbox = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_reference_detector() {
        let c = DetectorConfig::new();
        assert_eq!((c.model_width, c.model_height), (640, 384));
        assert_eq!(c.confidence, 0.4);
        assert_eq!(c.iou, 0.4);
        assert_eq!(c.max_nms, 30000);
        assert_eq!(c.max_wh, 4096.);
        assert_eq!(c.pad_color, [114, 114, 114]);
        assert!(!c.dynamic_input);
    }

    #[test]
    fn builder() {
        let c = DetectorConfig::new()
            .with_model("yolo.onnx")
            .with_device(InferenceDevice::CUDA(1))
            .with_dynamic_input(true)
            .with_names(&["cat", "dog"]);
        assert_eq!(c.onnx_path, "yolo.onnx");
        assert_eq!(c.device, InferenceDevice::CUDA(1));
        assert!(c.dynamic_input);
        assert_eq!(c.names, Some(vec!["cat".to_string(), "dog".to_string()]));
    }
}
