pub mod inference_engine;
pub mod inference_process;
pub mod ort_detector;

pub use inference_engine::InferenceEngine;
pub use inference_process::InferenceProcess;
pub use ort_detector::*;
