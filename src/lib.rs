mod utils;
mod detectors;
pub mod common;
pub mod data;
pub mod detection_runners;
pub mod error;

use std::time::Instant;
use crate::common::{Frame, ModelConfig, Prediction};
use crate::detection_runners::image_ops::PAD_COLOR;
use crate::detection_runners::{InferenceEngine, YoloDetector};

pub use crate::detectors::spawn_detector_worker;
pub use crate::error::DetectError;

pub type Result<T, E = DetectError> = std::result::Result<T, E>;

pub fn init_detector(model_details: &ModelConfig) -> anyhow::Result<YoloDetector> {
    log::info!("Initializing ORT session with ({}) execution provider", model_details.inference_device);
    let detector = YoloDetector::new(model_details.to_detector_config())?;
    warm_up(&detector)?;
    Ok(detector)
}

/// Runs the configured number of dry detections on a blank frame.
pub fn warm_up<E: InferenceEngine>(detector: &YoloDetector<E>) -> Result<()> {
    let (width, height) = detector.target_size();
    let blank = Frame::filled(width, height, PAD_COLOR);
    for _ in 0..detector.config().num_dry_run {
        detector.detect_default(&blank)?;
    }
    Ok(())
}

pub fn run_detection<E: InferenceEngine>(
    detector: &YoloDetector<E>,
    frame: &Frame,
    confidence: f32,
) -> anyhow::Result<Vec<Prediction>> {
    let now = Instant::now();

    let detections = detector.detect(frame, confidence)?;

    log::debug!("Processing time: {:?}", now.elapsed());

    Ok(detections)
}
