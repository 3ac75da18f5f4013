use crossbeam_channel::{bounded, Receiver, Sender};
use crate::common::{Frame, Prediction};
use crate::Result;

/// A frame queued for detection. `None` uses the detector's configured
/// confidence.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub frame: Frame,
    pub confidence: Option<f32>,
}

impl DetectionRequest {
    pub fn new(frame: Frame) -> Self {
        Self { frame, confidence: None }
    }

    pub fn with_confidence(mut self, x: f32) -> Self {
        self.confidence = Some(x);
        self
    }
}

pub type DetectionResponse = Result<Vec<Prediction>>;

/// Worker side of the detection queue.
#[derive(Debug)]
pub struct DetectionState {
    pub opt_rx: Receiver<Box<DetectionRequest>>,
    pub det_tx: Sender<Box<DetectionResponse>>,
}

/// Caller side of the detection queue.
#[derive(Debug)]
pub struct SendState {
    pub opt_tx: Sender<Box<DetectionRequest>>,
    pub det_rx: Receiver<Box<DetectionResponse>>,
}

impl SendState {
    /// Queues `request` and blocks for its result.
    pub fn detect(&self, request: DetectionRequest) -> anyhow::Result<Vec<Prediction>> {
        self.opt_tx
            .send(Box::new(request))
            .map_err(|_| anyhow::anyhow!("detector worker has stopped"))?;
        let response = self.det_rx.recv()?;
        Ok((*response)?)
    }
}

/// Bounded request queue and its response channel.
pub fn detection_channels(capacity: usize) -> (SendState, DetectionState) {
    let (opt_tx, opt_rx) = bounded(capacity);
    let (det_tx, det_rx) = bounded(capacity);
    (SendState { opt_tx, det_rx }, DetectionState { opt_rx, det_tx })
}
