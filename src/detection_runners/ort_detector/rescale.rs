use crate::common::BBox;
use crate::detection_runners::ort_detector::image_ops::LetterboxResult;

/// Maps a box from letterboxed coordinates back onto the original image.
///
/// The content region of the letterboxed image spans
/// `pad_top_left + pad_remainder .. letterboxed_size - pad_top_left`; each axis
/// is scaled independently by `original / content`. No clipping: boxes that
/// reach into the padding can land outside the original image.
pub fn rescale_box(
    bbox: &BBox,
    original_size: (u32, u32),
    letterboxed_size: (u32, u32),
    pad_top_left: (i32, i32),
    pad_remainder: (i32, i32),
) -> BBox {
    let start_x = (pad_top_left.0 + pad_remainder.0) as f32;
    let start_y = (pad_top_left.1 + pad_remainder.1) as f32;
    let end_x = letterboxed_size.0 as f32 - pad_top_left.0 as f32;
    let end_y = letterboxed_size.1 as f32 - pad_top_left.1 as f32;

    let ratio_x = original_size.0 as f32 / (end_x - start_x);
    let ratio_y = original_size.1 as f32 / (end_y - start_y);

    BBox::new(
        ratio_x * (bbox.x1 - start_x),
        ratio_y * (bbox.y1 - start_y),
        ratio_x * (bbox.x2 - start_x),
        ratio_y * (bbox.y2 - start_y),
    )
}

/// [`rescale_box`] with the geometry taken from a letterbox pass.
pub fn rescale_from_letterbox(bbox: &BBox, original_size: (u32, u32), lb: &LetterboxResult) -> BBox {
    rescale_box(
        bbox,
        original_size,
        lb.dimensions(),
        lb.pad_top_left,
        lb.pad_remainder,
    )
}
