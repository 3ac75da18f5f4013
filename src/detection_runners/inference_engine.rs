use crate::detection_runners::input_wrapper::PackedTensor;
use crate::detection_runners::candidates::RawPrediction;
use crate::Result;

/// The neural-network call the pipeline wraps.
///
/// Implementations receive a packed `(1, 3, H, W)` tensor and return one
/// [`RawPrediction`] per model output; only the first is consumed. A
/// cancelled call must return [`DetectError::Aborted`](crate::DetectError::Aborted)
/// rather than an empty output.
pub trait InferenceEngine: Send {
    /// Declared input shape, `0` marking a dynamic dimension.
    fn input_shape(&self) -> &[usize];

    fn run(&mut self, x: &PackedTensor) -> Result<Vec<RawPrediction>>;

    /// Class names embedded in the model, if any.
    fn class_names(&self) -> Option<Vec<String>> {
        None
    }

    /// Declared `(width, height)` of the input, `None` for dynamic axes.
    fn fixed_input_size(&self) -> Option<(u32, u32)> {
        match self.input_shape() {
            [_, _, h, w] if *h > 0 && *w > 0 => Some((*w as u32, *h as u32)),
            _ => None,
        }
    }
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    fn input_shape(&self) -> &[usize] {
        (**self).input_shape()
    }

    fn run(&mut self, x: &PackedTensor) -> Result<Vec<RawPrediction>> {
        (**self).run(x)
    }

    fn class_names(&self) -> Option<Vec<String>> {
        (**self).class_names()
    }
}
