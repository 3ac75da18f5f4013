use ndarray::{Array, IxDyn};
use crate::error::DetectError;
use crate::Result;

/// Model input, wrapper over [`Array<f32, IxDyn>`] in `(N, C, H, W)` layout.
#[derive(Debug, Clone, Default)]
pub struct PackedTensor(pub Array<f32, IxDyn>);

impl From<Array<f32, IxDyn>> for PackedTensor {
    fn from(x: Array<f32, IxDyn>) -> Self {
        Self(x)
    }
}

impl std::ops::Deref for PackedTensor {
    type Target = Array<f32, IxDyn>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PackedTensor {
    pub fn from_shape_vec(shape: &[usize], xs: Vec<f32>) -> Result<Self> {
        Ok(Self::from(Array::from_shape_vec(shape, xs)?))
    }

    /// Compares against an engine's declared input shape, where a `0`
    /// entry stands for a dynamic dimension.
    pub fn check_shape(&self, declared: &[usize]) -> Result<()> {
        let shape = self.shape();
        let fits = shape.len() == declared.len()
            && shape.iter().zip(declared).all(|(&s, &d)| d == 0 || s == d);
        if fits {
            Ok(())
        } else {
            Err(DetectError::shape(declared, shape))
        }
    }

    pub fn into_inner(self) -> Array<f32, IxDyn> {
        self.0
    }
}
