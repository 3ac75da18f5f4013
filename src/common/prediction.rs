use serde::{Deserialize, Serialize};
use crate::common::BBox;

/// A labeled detection in original-image coordinates.
///
/// Boxes are not clipped: a box that reached into the letterbox padding may
/// extend past the image bounds.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub bbox: BBox,
    pub label: String,
    pub class_id: usize,
    pub confidence: f32,
}

impl Prediction {
    pub fn new(bbox: BBox, label: &str, class_id: usize, confidence: f32) -> Self {
        Self {
            bbox,
            label: label.to_string(),
            class_id,
            confidence,
        }
    }

    pub fn bbox(&self) -> &BBox {
        &self.bbox
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn class_id(&self) -> usize {
        self.class_id
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (x1, y1, x2, y2) = self.bbox.as_xyxy_i32();
        write!(
            f,
            "{} (#{}) {:.2} [{}, {}, {}, {}]",
            self.label, self.class_id, self.confidence, x1, y1, x2, y2
        )
    }
}
