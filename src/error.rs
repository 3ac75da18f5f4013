use thiserror::Error;

/// Failures surfaced by the detection pipeline.
///
/// `ShapeMismatch` and `LabelIndexOutOfRange` are configuration defects: the
/// model and the label table disagree with what the pipeline was built for.
/// They are returned rather than panicking, but callers should treat them as
/// fatal and stop feeding frames to the detector.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    #[error("class index {index} has no label (label table holds {len} entries)")]
    LabelIndexOutOfRange { index: usize, len: usize },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("detection aborted before the inference call completed")]
    Aborted,

    #[error("configuration error: {0}")]
    Config(String),
}

impl DetectError {
    pub(crate) fn shape(expected: impl std::fmt::Debug, got: impl std::fmt::Debug) -> Self {
        Self::ShapeMismatch {
            expected: format!("{expected:?}"),
            got: format!("{got:?}"),
        }
    }
}

impl From<ndarray::ShapeError> for DetectError {
    fn from(e: ndarray::ShapeError) -> Self {
        DetectError::ShapeMismatch {
            expected: "a contiguous buffer matching the declared shape".to_string(),
            got: e.to_string(),
        }
    }
}
