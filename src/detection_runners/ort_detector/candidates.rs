//! Raw model output and objectness filtering.

use crate::error::DetectError;
use crate::Result;

/// Index of the objectness attribute in a prediction row.
pub const OBJECTNESS: usize = 4;

/// Index of the first class score in a prediction row.
pub const FIRST_CLASS: usize = 5;

/// Logical shape of a raw prediction buffer: `(batch, candidates, attributes)`
/// with `attributes = 5 + number of classes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionShape {
    pub batch: usize,
    pub candidates: usize,
    pub attributes: usize,
}

impl PredictionShape {
    pub fn new(batch: usize, candidates: usize, attributes: usize) -> Self {
        Self {
            batch,
            candidates,
            attributes,
        }
    }

    pub fn from_dims(dims: &[usize]) -> Result<Self> {
        match dims {
            [batch, candidates, attributes] => Ok(Self::new(*batch, *candidates, *attributes)),
            _ => Err(DetectError::shape("[batch, candidates, 5 + classes]", dims)),
        }
    }

    pub fn len(&self) -> usize {
        self.batch * self.candidates * self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_classes(&self) -> usize {
        self.attributes.saturating_sub(FIRST_CLASS)
    }
}

/// Flat prediction buffer as returned by the inference engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    data: Vec<f32>,
    shape: PredictionShape,
}

impl RawPrediction {
    /// Fails with `ShapeMismatch` if the buffer length does not match the
    /// shape or a row is too short to hold a box, objectness and one class.
    pub fn new(data: Vec<f32>, shape: PredictionShape) -> Result<Self> {
        if shape.attributes <= FIRST_CLASS {
            return Err(DetectError::shape(
                "at least 6 attributes per candidate",
                shape.attributes,
            ));
        }
        if data.len() != shape.len() {
            return Err(DetectError::shape(shape.len(), data.len()));
        }
        Ok(Self { data, shape })
    }

    pub fn from_dims(data: Vec<f32>, dims: &[usize]) -> Result<Self> {
        Self::new(data, PredictionShape::from_dims(dims)?)
    }

    pub fn shape(&self) -> PredictionShape {
        self.shape
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Checks the attribute layout against the size of the label table.
    pub fn expect_classes(&self, num_classes: usize) -> Result<()> {
        if self.shape.num_classes() != num_classes {
            return Err(DetectError::shape(
                format!("{} attributes (5 + {} classes)", FIRST_CLASS + num_classes, num_classes),
                format!("{} attributes", self.shape.attributes),
            ));
        }
        Ok(())
    }
}

/// One prediction row that passed the objectness threshold, class scores
/// already multiplied by objectness.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    values: Vec<f32>,
}

impl Candidate {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Center-form box `(cx, cy, w, h)`.
    pub fn cxcywh(&self) -> (f32, f32, f32, f32) {
        (self.values[0], self.values[1], self.values[2], self.values[3])
    }

    pub fn objectness(&self) -> f32 {
        self.values[OBJECTNESS]
    }

    pub fn class_scores(&self) -> &[f32] {
        &self.values[FIRST_CLASS..]
    }
}

/// Walks every `(batch, slot)` row and yields those whose objectness is
/// strictly above `objectness_threshold`, scaling each class score by it.
pub fn extract_candidates(
    raw: &RawPrediction,
    objectness_threshold: f32,
) -> impl Iterator<Item = Candidate> + '_ {
    raw.data
        .chunks_exact(raw.shape.attributes)
        .filter(move |row| row[OBJECTNESS] > objectness_threshold)
        .map(|row| {
            let objectness = row[OBJECTNESS];
            let mut values = row.to_vec();
            values[FIRST_CLASS..].iter_mut().for_each(|s| *s *= objectness);
            Candidate::new(values)
        })
}
