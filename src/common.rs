mod bbox;
mod frame;
mod label_map;
mod model_config;
mod prediction;
pub mod inference_device;

pub use bbox::*;
pub use frame::*;
pub use inference_device::InferenceDevice;
pub use label_map::*;
pub use model_config::*;
pub use prediction::*;
