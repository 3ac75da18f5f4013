mod ort_engine;
mod ort_inference;
pub mod candidates;
pub mod image_ops;
pub mod input_wrapper;
pub mod nms;
pub mod rescale;

pub use ort_engine::*;
pub use ort_inference::*;
