use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use anyhow::Context;
use ort::{
    execution_providers::{
        CPUExecutionProvider, CUDAExecutionProvider, ExecutionProvider, TensorRTExecutionProvider,
    },
    session::builder::{GraphOptimizationLevel, SessionBuilder},
    session::{Session, SessionInputValue},
    value::Value,
};
use crate::common::{InferenceDevice, LabelMap};
use crate::data::{DetectorConfig, TimeCalc, CROSS_MARK};
use crate::detection_runners::candidates::RawPrediction;
use crate::detection_runners::inference_engine::InferenceEngine;
use crate::detection_runners::input_wrapper::PackedTensor;
use crate::error::DetectError;
use crate::Result;

/// ONNX Runtime backend. The session is released on drop.
#[derive(Debug)]
pub struct OrtEngine {
    session: Session,
    input_shape: Vec<usize>,
    output_names: Vec<String>,
    profile: bool,
    pub infer_time: TimeCalc,
}

impl OrtEngine {
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        Self::build(config).map_err(|e| match e.downcast::<DetectError>() {
            Ok(e) => e,
            Err(e) => DetectError::ModelLoad(format!("{e:#}")),
        })
    }

    fn build(config: &DetectorConfig) -> anyhow::Result<Self> {
        if config.onnx_path.is_empty() {
            anyhow::bail!("no model path configured");
        }

        if !Path::new(&config.onnx_path).is_file() {
            anyhow::bail!("model file {} not found", config.onnx_path);
        }
        if !config.ort_lib_path.is_empty() && !Path::new(&config.ort_lib_path).is_file() {
            anyhow::bail!("ONNX Runtime library {} not found", config.ort_lib_path);
        }

        // the runtime panics instead of erroring when the dylib cannot be loaded
        let committed = panic::catch_unwind(AssertUnwindSafe(|| {
            if config.ort_lib_path.is_empty() {
                ort::init().commit()
            } else {
                ort::init_from(&config.ort_lib_path).commit()
            }
        }));
        match committed {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => anyhow::bail!("{CROSS_MARK} failed to commit ONNX Runtime environment: {e:?}"),
            Err(payload) => anyhow::bail!(
                "{CROSS_MARK} failed to load ONNX Runtime: {}",
                panic_message(payload.as_ref())
            ),
        };

        let mut builder = Session::builder()?;

        let mut device = config.device;
        match device {
            InferenceDevice::TensorRT(device_id) => {
                Self::build_trt(&mut builder, device_id).unwrap_or_else(|err| {
                    log::warn!("{err}, Using cpu");
                    device = InferenceDevice::CPU;
                })
            }
            InferenceDevice::CUDA(device_id) => {
                Self::build_cuda(&mut builder, device_id).unwrap_or_else(|err| {
                    log::warn!("{err}, Using cpu");
                    device = InferenceDevice::CPU;
                })
            }
            InferenceDevice::CPU => Self::build_cpu(&mut builder)?,
        }

        let session = builder
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(&config.onnx_path)
            .with_context(|| format!("cannot load model from {}", config.onnx_path))?;

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.to_string()).collect();
        if output_names.is_empty() {
            anyhow::bail!("model {} declares no outputs", config.onnx_path);
        }

        let input = session.inputs.first().context("model declares no inputs")?;
        let dims = input
            .input_type
            .tensor_shape()
            .with_context(|| format!("input {} is not a tensor", input.name))?;
        let mut input_shape = declared_input_shape(dims)?;
        if config.dynamic_input {
            input_shape[2] = 0;
            input_shape[3] = 0;
        }

        log::info!(
            "Backend: ONNXRuntime | Device: {} | Input: {:?} | Outputs: {:?}",
            device,
            input_shape,
            output_names,
        );

        Ok(Self {
            session,
            input_shape,
            output_names,
            profile: config.profile,
            infer_time: TimeCalc::default(),
        })
    }

    fn build_trt(builder: &mut SessionBuilder, device_id: usize) -> anyhow::Result<()> {
        let trt = TensorRTExecutionProvider::default()
            .with_device_id(device_id as i32)
            .with_engine_cache(true)
            .with_engine_cache_path("trt-cache")
            .with_timing_cache(false);
        if trt.is_available()? {
            match trt.register(builder) {
                Ok(_) => {}
                Err(err) => anyhow::bail!("{CROSS_MARK} TensorRT initialization failed: {:?}", err),
            }
            log::info!("Initial model serialization with TensorRT may take some time");
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} TensorRT execution provider not available")
        }
    }

    fn build_cuda(builder: &mut SessionBuilder, device_id: usize) -> anyhow::Result<()> {
        let ep = CUDAExecutionProvider::default().with_device_id(device_id as i32);
        if ep.is_available()? {
            match ep.register(builder) {
                Ok(_) => {}
                Err(err) => anyhow::bail!("{CROSS_MARK} CUDA initialization failed: {:?}", err),
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CUDA execution provider not available")
        }
    }

    fn build_cpu(builder: &mut SessionBuilder) -> anyhow::Result<()> {
        let ep = CPUExecutionProvider::default();
        if ep.is_available()? {
            match ep.register(builder) {
                Ok(_) => {}
                Err(err) => anyhow::bail!("{CROSS_MARK} CPU initialization failed: {:?}", err),
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CPU execution provider not available")
        }
    }

    fn engine_run(&mut self, x: &PackedTensor) -> anyhow::Result<Vec<RawPrediction>> {
        let t_pre = std::time::Instant::now();
        let xs_ = vec![SessionInputValue::from(Value::from_array(x.0.clone())?.into_dyn())];
        let t_pre = t_pre.elapsed();
        self.infer_time.add_or_push(0, t_pre);

        let t_run = std::time::Instant::now();
        let outputs = self.session.run(&xs_[..])?;
        let t_run = t_run.elapsed();
        self.infer_time.add_or_push(1, t_run);

        let t_post = std::time::Instant::now();
        let mut ys = Vec::with_capacity(self.output_names.len());
        for name in self.output_names.iter() {
            let y = outputs[name.as_str()]
                .try_extract_array::<f32>()
                .with_context(|| format!("output {name} is not a f32 tensor"))?;
            let dims = y.shape().to_vec();
            let data: Vec<f32> = y.iter().copied().collect();
            ys.push(RawPrediction::from_dims(data, &dims)?);
        }
        let t_post = t_post.elapsed();
        self.infer_time.add_or_push(2, t_post);

        if self.profile {
            log::info!(
                "[Profile] {:.4?} ({:.4?} avg) [to_ort: {:.4?} | inference: {:.4?} | to_f32: {:.4?}]",
                t_pre + t_run + t_post,
                self.infer_time.avg(),
                t_pre,
                t_run,
                t_post,
            );
        }
        Ok(ys)
    }

    pub fn try_fetch(&self, key: &str) -> Option<String> {
        match self.session.metadata() {
            Err(_) => None,
            Ok(metadata) => metadata.custom(key).unwrap_or_default(),
        }
    }

}

impl InferenceEngine for OrtEngine {
    fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    fn run(&mut self, x: &PackedTensor) -> Result<Vec<RawPrediction>> {
        self.engine_run(x).map_err(|e| match e.downcast::<DetectError>() {
            Ok(e) => e,
            Err(e) => DetectError::Inference(format!("{e:#}")),
        })
    }

    fn class_names(&self) -> Option<Vec<String>> {
        // e.g. `{0: 'person', 1: 'bicycle', 27: "yellow_lady's_slipper"}`
        self.try_fetch("names")
            .and_then(|names| LabelMap::from_metadata(&names))
            .map(|labels| labels.names().to_vec())
    }
}

/// Model input dims as `[1, 3, H, W]`, dynamic axes as 0.
fn declared_input_shape(dims: &[i64]) -> Result<Vec<usize>> {
    let shape: Vec<usize> = dims.iter().map(|&d| d.max(0) as usize).collect();
    match shape[..] {
        [0 | 1, 3, h, w] => Ok(vec![1, 3, h, w]),
        _ => Err(DetectError::shape("[1, 3, H, W]", dims)),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_model_input() {
        assert_eq!(declared_input_shape(&[1, 3, 384, 640]).unwrap(), vec![1, 3, 384, 640]);
    }

    #[test]
    fn dynamic_axes_become_zero() {
        assert_eq!(declared_input_shape(&[-1, 3, -1, -1]).unwrap(), vec![1, 3, 0, 0]);
        assert_eq!(declared_input_shape(&[1, 3, 640, -1]).unwrap(), vec![1, 3, 640, 0]);
    }

    #[test]
    fn non_image_input_is_rejected() {
        for dims in [&[1, 1, 384, 640][..], &[2, 3, 384, 640], &[1, 3, 640], &[1, 384, 640, 3]] {
            assert!(matches!(declared_input_shape(dims), Err(DetectError::ShapeMismatch { .. })));
        }
    }

    #[test]
    fn missing_files_fail_before_runtime_init() {
        let config = DetectorConfig::new().with_model("/nonexistent/yolov5s.onnx");
        assert!(matches!(OrtEngine::new(&config), Err(DetectError::ModelLoad(_))));

        let config = DetectorConfig::new()
            .with_model(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"))
            .with_ort_lib_path("/nonexistent/libonnxruntime.so");
        assert!(matches!(OrtEngine::new(&config), Err(DetectError::ModelLoad(_))));
    }

    #[test]
    fn panic_payloads_are_readable() {
        let err = panic::catch_unwind(|| panic!("no dylib")).unwrap_err();
        assert_eq!(panic_message(err.as_ref()), "no dylib");
        let err = panic::catch_unwind(|| panic!("{} missing", "libonnxruntime.so")).unwrap_err();
        assert_eq!(panic_message(err.as_ref()), "libonnxruntime.so missing");
    }
}
