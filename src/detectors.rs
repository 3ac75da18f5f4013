use std::sync::Arc;
use std::thread::JoinHandle;
use anyhow::Context;
use crate::data::{detection_channels, DetectionState, SendState};
use crate::detection_runners::{InferenceEngine, YoloDetector};

/// Starts a thread that serves detection requests from a bounded queue of
/// `capacity` frames. The worker stops once every [`SendState`] sender is
/// dropped.
pub fn spawn_detector_worker<E>(
    detector: Arc<YoloDetector<E>>,
    capacity: usize,
) -> anyhow::Result<(SendState, JoinHandle<()>)>
where
    E: InferenceEngine + 'static,
{
    let (send_state, detection_state) = detection_channels(capacity);
    let handle = std::thread::Builder::new()
        .name("yolo-detector".to_string())
        .spawn(move || detection_loop(&detector, detection_state))
        .context("failed to spawn detector worker")?;
    Ok((send_state, handle))
}

fn detection_loop<E: InferenceEngine>(detector: &YoloDetector<E>, detection_state: DetectionState) {
    // MESSAGE LOOP STARTS HERE
    while let Ok(request) = detection_state.opt_rx.recv() {
        let confidence = request.confidence.unwrap_or(detector.config().confidence);
        let detections = detector.detect(&request.frame, confidence);
        if let Err(err) = &detections {
            log::error!("yolo_detect: detection failed: {}", err);
        }
        if detection_state.det_tx.send(Box::new(detections)).is_err() {
            log::warn!("yolo_detect: result receiver dropped, stopping worker");
            break;
        }
    }
    log::info!("yolo_detect: detector worker stopped");
}
