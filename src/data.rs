mod config_detector;
mod time_calc;
pub mod send_channels;

pub use config_detector::DetectorConfig;
pub use send_channels::{detection_channels, DetectionRequest, DetectionResponse, DetectionState, SendState};
pub use time_calc::TimeCalc;

pub use crate::detection_runners::candidates::{Candidate, PredictionShape, RawPrediction};
pub use crate::detection_runners::image_ops::{LetterboxOptions, LetterboxPolicy, LetterboxResult};
pub use crate::detection_runners::input_wrapper::PackedTensor;
pub use crate::detection_runners::nms::DetectionRow;

pub(crate) const CROSS_MARK: &str = "❌";
