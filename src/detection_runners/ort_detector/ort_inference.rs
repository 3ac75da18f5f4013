use parking_lot::{Mutex, MutexGuard};
use crate::common::{Frame, LabelMap, Prediction};
use crate::data::DetectorConfig;
use crate::detection_runners::candidates::{extract_candidates, RawPrediction};
use crate::detection_runners::image_ops::{letterbox, pack, LetterboxOptions};
use crate::detection_runners::inference_engine::InferenceEngine;
use crate::detection_runners::inference_process::InferenceProcess;
use crate::detection_runners::input_wrapper::PackedTensor;
use crate::detection_runners::nms::{build_detection_matrix, non_max_suppression};
use crate::detection_runners::ort_detector::OrtEngine;
use crate::detection_runners::rescale::rescale_box;
use crate::error::DetectError;
use crate::Result;

/// A letterboxed, packed frame and the geometry needed to map boxes back.
#[derive(Debug, Clone)]
pub struct PreparedFrame {
    pub original_size: (u32, u32),
    pub letterboxed_size: (u32, u32),
    pub pad_top_left: (i32, i32),
    pub pad_remainder: (i32, i32),
    pub tensor: PackedTensor,
}

/// YOLO detector over an [`InferenceEngine`].
///
/// Every intermediate buffer is allocated per call and only the engine call
/// is serialized, so a detector can be shared between threads.
#[derive(Debug)]
pub struct YoloDetector<E: InferenceEngine = OrtEngine> {
    engine: Mutex<E>,
    config: DetectorConfig,
    labels: LabelMap,
    input_shape: Vec<usize>,
    target: (u32, u32),
}

impl YoloDetector<OrtEngine> {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let engine = OrtEngine::new(&config)?;
        Self::with_engine(engine, config)
    }
}

impl<E: InferenceEngine> YoloDetector<E> {
    pub fn with_engine(engine: E, config: DetectorConfig) -> Result<Self> {
        let labels = Self::resolve_labels(&engine, &config)?;
        if labels.is_empty() {
            return Err(DetectError::Config("label table is empty".to_string()));
        }

        let input_shape = engine.input_shape().to_vec();
        if input_shape.len() != 4 || input_shape[..2] != [1, 3] {
            return Err(DetectError::shape("[1, 3, H, W]", &input_shape));
        }
        let target = engine
            .fixed_input_size()
            .unwrap_or((config.model_width, config.model_height));
        if target.0 == 0 || target.1 == 0 {
            return Err(DetectError::Config(format!(
                "model input {}x{} is empty",
                target.0, target.1
            )));
        }

        log::info!(
            "YOLO detector | Input: {}x{} ({}) | Classes: {} | Confidence: {} | IoU: {}",
            target.0,
            target.1,
            if engine.fixed_input_size().is_some() { "fixed" } else { "dynamic" },
            labels.len(),
            config.confidence,
            config.iou,
        );

        Ok(Self {
            engine: Mutex::new(engine),
            config,
            labels,
            input_shape,
            target,
        })
    }

    /// Class names: user-defined (labels file, then `names`), else parsed from
    /// the model, else COCO. User-defined names must match the parsed count.
    fn resolve_labels(engine: &E, config: &DetectorConfig) -> Result<LabelMap> {
        let user = match (&config.labels_path, &config.names) {
            (Some(path), _) => Some(LabelMap::from_file(path)?),
            (None, Some(names)) => Some(LabelMap::new(names.clone())),
            (None, None) => None,
        };
        let parsed = engine.class_names().map(LabelMap::new);

        match (user, parsed) {
            (Some(user), Some(parsed)) if user.len() != parsed.len() => Err(DetectError::Config(format!(
                "The lengths of parsed class names: {} and user-defined class names: {} do not match.",
                parsed.len(),
                user.len(),
            ))),
            (Some(user), _) => Ok(user),
            (None, Some(parsed)) => Ok(parsed),
            (None, None) => Ok(LabelMap::coco()),
        }
    }

    /// Letterbox parameters for a frame of `src` size.
    ///
    /// Auto padding can shrink the output below the target, so a fixed-shape
    /// engine gets full padding instead.
    pub fn letterbox_options(&self, src: (u32, u32)) -> LetterboxOptions {
        let (mut auto, scale_fill) = self.config.letterbox.flags(src, self.target);
        if auto && self.is_fixed_input() {
            log::debug!("auto padding disabled: engine input is fixed at {:?}", self.input_shape);
            auto = false;
        }
        LetterboxOptions::new(self.target.0, self.target.1)
            .with_pad_color(self.config.pad_color)
            .with_auto(auto)
            .with_scale_fill(scale_fill)
    }

    /// Detects objects in `frame`. `confidence` is used as the objectness,
    /// class score and NMS score threshold alike.
    pub fn detect(&self, frame: &Frame, confidence: f32) -> Result<Vec<Prediction>> {
        self.forward(frame, confidence, self.config.profile)
    }

    /// [`detect`](Self::detect) with the configured confidence.
    pub fn detect_default(&self, frame: &Frame) -> Result<Vec<Prediction>> {
        self.detect(frame, self.config.confidence)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Letterbox target as `(width, height)`.
    pub fn target_size(&self) -> (u32, u32) {
        self.target
    }

    pub fn is_fixed_input(&self) -> bool {
        self.input_shape[2] > 0 && self.input_shape[3] > 0
    }

    /// Blocks until no detection holds the engine.
    pub fn engine(&self) -> MutexGuard<'_, E> {
        self.engine.lock()
    }
}

impl<E: InferenceEngine> InferenceProcess for YoloDetector<E> {
    type Input = Frame;
    type Prepared = PreparedFrame;
    type Raw = RawPrediction;
    type Output = Vec<Prediction>;

    fn preprocess(&self, frame: &Frame) -> Result<PreparedFrame> {
        frame.validate()?;
        let lb = letterbox(frame, &self.letterbox_options(frame.dimensions()))?;
        let tensor = pack(&lb.image)?;
        tensor.check_shape(&self.input_shape)?;

        Ok(PreparedFrame {
            original_size: frame.dimensions(),
            letterboxed_size: lb.dimensions(),
            pad_top_left: lb.pad_top_left,
            pad_remainder: lb.pad_remainder,
            tensor,
        })
    }

    fn inference(&self, x: &PreparedFrame) -> Result<RawPrediction> {
        let ys = self.engine.lock().run(&x.tensor)?;
        let y = ys
            .into_iter()
            .next()
            .ok_or_else(|| DetectError::shape("at least one output", "none"))?;
        y.expect_classes(self.labels.len())?;
        Ok(y)
    }

    fn postprocess(&self, ys: RawPrediction, x: &PreparedFrame, confidence: f32) -> Result<Vec<Prediction>> {
        let rows = build_detection_matrix(
            extract_candidates(&ys, confidence),
            confidence,
            self.config.max_nms,
        );
        let keep = non_max_suppression(&rows, self.config.iou, self.config.max_wh);

        keep.into_iter()
            .map(|i| {
                let row = &rows[i];
                let label = self.labels.get(row.class_id)?;
                let bbox = rescale_box(
                    &row.bbox,
                    x.original_size,
                    x.letterboxed_size,
                    x.pad_top_left,
                    x.pad_remainder,
                );
                Ok(Prediction::new(bbox, label, row.class_id, row.score))
            })
            .collect()
    }
}
