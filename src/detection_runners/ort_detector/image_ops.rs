//! Letterboxing and tensor packing for the model input.

use fast_image_resize::{
    images::{CroppedImageMut, Image as FirImage},
    pixels::PixelType,
    FilterType, ResizeAlg, ResizeOptions, Resizer,
};
use ndarray::{Array3, Axis};
use serde::{Deserialize, Serialize};
use crate::common::Frame;
use crate::detection_runners::input_wrapper::PackedTensor;
use crate::error::DetectError;
use crate::Result;

/// Padding is reduced modulo the backbone stride when auto padding applies.
pub const AUTO_PAD_STRIDE: i64 = 32;

/// Default fill colour of the padded border.
pub const PAD_COLOR: [u8; 3] = [114, 114, 114];

/// How the detector letterboxes each frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LetterboxPolicy {
    /// Auto padding for frames larger than the target in both dimensions,
    /// scale-to-fill for everything else.
    #[default]
    Adaptive,
    /// Keep aspect ratio, trim the padding to the stride remainder.
    Auto,
    /// Stretch to the target, no padding.
    ScaleFill,
    /// Keep aspect ratio, pad to exactly the target.
    Pad,
}

impl LetterboxPolicy {
    /// Returns `(auto, scale_fill)` for a frame of `src` size against `target`.
    pub fn flags(&self, src: (u32, u32), target: (u32, u32)) -> (bool, bool) {
        match self {
            LetterboxPolicy::Adaptive => {
                let auto = !(src.0 <= target.0 || src.1 <= target.1);
                (auto, !auto)
            }
            LetterboxPolicy::Auto => (true, false),
            LetterboxPolicy::ScaleFill => (false, true),
            LetterboxPolicy::Pad => (false, false),
        }
    }
}

/// Parameters of a single letterbox pass. `target` is `(width, height)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxOptions {
    pub target: (u32, u32),
    pub pad_color: [u8; 3],
    pub auto: bool,
    pub scale_fill: bool,
    pub scale_up: bool,
}

impl LetterboxOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: (width, height),
            pad_color: PAD_COLOR,
            auto: false,
            scale_fill: false,
            scale_up: true,
        }
    }

    pub fn with_pad_color(mut self, rgb: [u8; 3]) -> Self {
        self.pad_color = rgb;
        self
    }

    pub fn with_auto(mut self, x: bool) -> Self {
        self.auto = x;
        self
    }

    pub fn with_scale_fill(mut self, x: bool) -> Self {
        self.scale_fill = x;
        self
    }

    pub fn with_scale_up(mut self, x: bool) -> Self {
        self.scale_up = x;
        self
    }
}

/// Output of [`letterbox`].
///
/// The content occupies columns `pad_top_left.0 + pad_remainder.0 ..
/// width - pad_top_left.0` (rows likewise). `pad_remainder` is 0 or -1 per
/// axis; -1 means the odd padding pixel went to the bottom/right border.
#[derive(Debug, Clone)]
pub struct LetterboxResult {
    pub image: Frame,
    pub scale_ratio: f32,
    pub pad_top_left: (i32, i32),
    pub pad_remainder: (i32, i32),
}

impl LetterboxResult {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Left and top border widths.
    pub fn content_origin(&self) -> (i32, i32) {
        (
            self.pad_top_left.0 + self.pad_remainder.0,
            self.pad_top_left.1 + self.pad_remainder.1,
        )
    }
}

/// Splits `d` padding pixels into `(half, remainder)`, `half + remainder`
/// going before the content and `half` after.
fn split_padding(d: i64) -> (i64, i64) {
    let half = (d as f32 / 2.).round() as i64;
    (half, d - half * 2)
}

/// Resizes `frame` into `opts.target` keeping its aspect ratio, padding the
/// rest with `opts.pad_color`. The output is always RGB.
///
/// With `auto` set and differing aspect ratios the padding is reduced modulo
/// [`AUTO_PAD_STRIDE`], so the output may be smaller than the target. With
/// `scale_fill` (and auto not taking effect) the frame is stretched to the
/// target without padding.
pub fn letterbox(frame: &Frame, opts: &LetterboxOptions) -> Result<LetterboxResult> {
    frame.validate()?;
    let (target_w, target_h) = opts.target;
    if target_w == 0 || target_h == 0 {
        return Err(DetectError::Config(format!(
            "letterbox target {}x{} is empty",
            target_w, target_h
        )));
    }

    let rgb = frame.to_rgb_packed()?;
    let (src_w, src_h) = frame.dimensions();

    let mut ratio = (target_w as f32 / src_w as f32).min(target_h as f32 / src_h as f32);
    if !opts.scale_up {
        ratio = ratio.min(1.0);
    }

    let mut unpad_w = ((src_w as f32 * ratio).round() as u32).clamp(1, target_w);
    let mut unpad_h = ((src_h as f32 * ratio).round() as u32).clamp(1, target_h);
    let mut dw = target_w as i64 - unpad_w as i64;
    let mut dh = target_h as i64 - unpad_h as i64;

    let target_aspect = target_h as f32 / target_w as f32;
    let src_aspect = src_h as f32 / src_w as f32;
    if opts.auto && target_aspect != src_aspect {
        dw %= AUTO_PAD_STRIDE;
        dh %= AUTO_PAD_STRIDE;
    } else if opts.scale_fill {
        dw = 0;
        dh = 0;
        unpad_w = target_w;
        unpad_h = target_h;
    }

    let (half_w, rem_w) = split_padding(dw);
    let (half_h, rem_h) = split_padding(dh);

    let left = (half_w + rem_w) as u32;
    let top = (half_h + rem_h) as u32;
    let out_w = unpad_w + dw as u32;
    let out_h = unpad_h + dh as u32;
    let padded = resize_into_border(
        rgb,
        (src_w, src_h),
        (out_w, out_h),
        [left, top, unpad_w, unpad_h],
        opts.pad_color,
    )?;

    log::trace!(
        "letterbox {}x{} -> {}x{} (content {}x{}, ratio {:.4}, pad {}/{} {}/{})",
        src_w, src_h, out_w, out_h, unpad_w, unpad_h, ratio, left, half_w, top, half_h
    );

    Ok(LetterboxResult {
        image: Frame::from_rgb(padded, out_w, out_h),
        scale_ratio: ratio,
        pad_top_left: (half_w as i32, half_h as i32),
        pad_remainder: (rem_w as i32, rem_h as i32),
    })
}

/// Resizes `rgb` into the `[left, top, width, height]` rect of a `size`
/// canvas filled with `color`.
fn resize_into_border(
    rgb: Vec<u8>,
    src: (u32, u32),
    size: (u32, u32),
    content: [u32; 4],
    color: [u8; 3],
) -> Result<Vec<u8>> {
    let [left, top, content_w, content_h] = content;
    let src_image = FirImage::from_vec_u8(src.0, src.1, rgb, PixelType::U8x3)
        .map_err(|e| DetectError::InvalidImage(format!("{e:?}")))?;
    let mut padded = FirImage::from_vec_u8(
        size.0,
        size.1,
        color.repeat(size.0 as usize * size.1 as usize),
        PixelType::U8x3,
    )
    .map_err(|e| DetectError::InvalidImage(format!("{e:?}")))?;

    // same size: nearest is a plain copy
    let alg = if src == (content_w, content_h) {
        ResizeAlg::Nearest
    } else {
        ResizeAlg::Convolution(FilterType::Bilinear)
    };
    {
        let mut cropped = CroppedImageMut::new(&mut padded, left, top, content_w, content_h)
            .map_err(|e| DetectError::InvalidImage(format!("content rect: {e:?}")))?;
        Resizer::new()
            .resize(&src_image, &mut cropped, &ResizeOptions::new().resize_alg(alg))
            .map_err(|e| DetectError::InvalidImage(format!("resize failed: {e:?}")))?;
    }

    Ok(padded.into_vec())
}

/// Packs an RGB frame into a `(1, 3, H, W)` tensor scaled to `[0, 1]`.
pub fn pack(image: &Frame) -> Result<PackedTensor> {
    let rgb = image.to_rgb_packed()?;
    let (w, h) = (image.width() as usize, image.height() as usize);

    let hwc = Array3::from_shape_vec((h, w, Frame::CHANNELS), rgb)?;
    let chw = hwc
        .permuted_axes([2, 0, 1])
        .mapv(|v| v as f32 / 255.0)
        .insert_axis(Axis(0));

    Ok(PackedTensor::from(chw.as_standard_layout().into_owned().into_dyn()))
}
