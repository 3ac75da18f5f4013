use regex::Regex;
use crate::error::DetectError;
use crate::{utils, Result};

/// COCO class names, in the order YOLO models trained on COCO emit them.
pub const COCO_LABELS: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Ordered class index → label table.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    names: Vec<String>,
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::coco()
    }
}

impl LabelMap {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn coco() -> Self {
        Self::new(COCO_LABELS.iter().map(|x| x.to_string()).collect())
    }

    /// One label per line; blank lines are skipped.
    pub fn from_file(path: &str) -> Result<Self> {
        let lines = utils::file_to_vec(path)
            .map_err(|e| DetectError::Config(format!("cannot read labels from {path}: {e}")))?;
        Ok(Self::new(
            lines
                .into_iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
        ))
    }

    /// Parses the `names` entry exported into ONNX metadata, e.g.
    /// `{0: 'person', 1: 'bicycle', 27: "yellow_lady's_slipper"}`.
    pub fn from_metadata(names: &str) -> Option<Self> {
        let re = Regex::new(r#"(['"])([-()\w '"]+)(['"])"#).ok()?;
        let parsed: Vec<String> = re
            .captures_iter(names)
            .map(|x| {
                let (_, [_, name, _]) = x.extract();
                name.to_string()
            })
            .collect();
        if parsed.is_empty() {
            None
        } else {
            Some(Self::new(parsed))
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Label for `class_id`; an index past the table is a configuration defect.
    pub fn get(&self, class_id: usize) -> Result<&str> {
        self.names
            .get(class_id)
            .map(String::as_str)
            .ok_or(DetectError::LabelIndexOutOfRange {
                index: class_id,
                len: self.names.len(),
            })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coco_table_lookup() {
        let labels = LabelMap::coco();
        assert_eq!(labels.len(), 80);
        assert_eq!(labels.get(0).unwrap(), "person");
        assert_eq!(labels.get(79).unwrap(), "toothbrush");
        assert!(matches!(
            labels.get(80),
            Err(DetectError::LabelIndexOutOfRange { index: 80, len: 80 })
        ));
    }

    #[test]
    fn parses_metadata_names() {
        let labels =
            LabelMap::from_metadata("{0: 'person', 1: 'sports ball', 2: 'traffic-light'}").unwrap();
        assert_eq!(labels.names(), ["person", "sports ball", "traffic-light"]);
        assert!(LabelMap::from_metadata("{}").is_none());
    }
}
