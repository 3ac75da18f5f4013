use std::time::{Duration, Instant};
use crate::utils;
use crate::Result;

/// Three-stage detection pipeline: preprocess, inference, postprocess.
pub trait InferenceProcess {
    type Input: ?Sized;
    /// Model input plus whatever geometry postprocessing needs.
    type Prepared;
    type Raw;
    type Output;

    /// Pre-process the input data.
    fn preprocess(&self, x: &Self::Input) -> Result<Self::Prepared>;

    /// Executes the model on the preprocessed data.
    fn inference(&self, x: &Self::Prepared) -> Result<Self::Raw>;

    /// Post-process the model's output.
    fn postprocess(&self, ys: Self::Raw, x: &Self::Prepared, confidence: f32) -> Result<Self::Output>;

    /// Executes the full pipeline.
    fn run(&self, x: &Self::Input, confidence: f32) -> Result<Self::Output> {
        let prepared = self.preprocess(x)?;
        let ys = self.inference(&prepared)?;
        self.postprocess(ys, &prepared, confidence)
    }

    /// Executes the full pipeline, tracing each stage.
    fn forward(&self, x: &Self::Input, confidence: f32, profile: bool) -> Result<Self::Output> {
        let detect_time = Instant::now();

        let t_pre = Instant::now();
        let prepared = self.preprocess(x)?;
        let t_pre = t_pre.elapsed();

        let mut detect_elapsed = utils::trace("TIME", "Preprocessing input", detect_time, Duration::ZERO);

        let t_exe = Instant::now();
        let ys = self.inference(&prepared)?;
        let t_exe = t_exe.elapsed();

        detect_elapsed = utils::trace("TIME", "Detection run", detect_time, detect_elapsed);

        let t_post = Instant::now();
        let ys = self.postprocess(ys, &prepared, confidence)?;
        let t_post = t_post.elapsed();

        utils::trace("TIME", "Postprocessing", detect_time, detect_elapsed);

        if profile {
            log::info!("> Preprocess: {t_pre:?} | Inference: {t_exe:?} | Postprocess: {t_post:?}");
        }

        Ok(ys)
    }
}
