use image::{DynamicImage, RgbImage, RgbaImage};
use rayon::prelude::*;
use crate::error::DetectError;
use crate::Result;

/// Byte order of the three interleaved channels of a pixel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Interleaved 8-bit, 3-channel pixel buffer.
///
/// `stride` is the number of bytes between the starts of two consecutive rows
/// and may exceed `width * 3` for frames handed over by capture devices.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
    order: ChannelOrder,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    pub fn new(data: Vec<u8>, width: u32, height: u32, stride: usize, order: ChannelOrder) -> Self {
        Self {
            data,
            width,
            height,
            stride,
            order,
        }
    }

    /// Tightly packed RGB frame.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self::new(data, width, height, width as usize * Self::CHANNELS, ChannelOrder::Rgb)
    }

    /// Tightly packed BGR frame, the usual layout of capture libraries.
    pub fn from_bgr(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self::new(data, width, height, width as usize * Self::CHANNELS, ChannelOrder::Bgr)
    }

    /// Solid-colour RGB frame.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb.repeat(width as usize * height as usize);
        Self::from_rgb(data, width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Checks that the frame is non-empty and its buffer covers every row.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DetectError::InvalidImage(format!(
                "zero dimension {}x{}",
                self.width, self.height
            )));
        }
        let row_bytes = self.width as usize * Self::CHANNELS;
        if self.stride < row_bytes {
            return Err(DetectError::InvalidImage(format!(
                "stride {} is shorter than a row of {} bytes",
                self.stride, row_bytes
            )));
        }
        let needed = self.stride * (self.height as usize - 1) + row_bytes;
        if self.data.len() < needed {
            return Err(DetectError::InvalidImage(format!(
                "buffer holds {} bytes, {}x{} with stride {} needs {}",
                self.data.len(),
                self.width,
                self.height,
                self.stride,
                needed
            )));
        }
        Ok(())
    }

    /// Pixel at `(x, y)` in the frame's own channel order.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = y as usize * self.stride + x as usize * Self::CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Copies the pixels into a tightly packed RGB buffer, dropping any row
    /// padding and swapping channels when the frame is BGR.
    pub fn to_rgb_packed(&self) -> Result<Vec<u8>> {
        self.validate()?;
        let row_bytes = self.width as usize * Self::CHANNELS;
        let mut out = vec![0u8; row_bytes * self.height as usize];

        out.par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                let src = &self.data[y * self.stride..y * self.stride + row_bytes];
                match self.order {
                    ChannelOrder::Rgb => row.copy_from_slice(src),
                    ChannelOrder::Bgr => {
                        for (d, s) in row.chunks_exact_mut(3).zip(src.chunks_exact(3)) {
                            d[0] = s[2];
                            d[1] = s[1];
                            d[2] = s[0];
                        }
                    }
                }
            });

        Ok(out)
    }

    /// Converts into an `image` crate buffer, e.g. for saving or drawing.
    pub fn to_rgb8(&self) -> Result<RgbImage> {
        let buf = self.to_rgb_packed()?;
        RgbImage::from_raw(self.width, self.height, buf)
            .ok_or_else(|| DetectError::InvalidImage("buffer does not fit an RgbImage".to_string()))
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::from_rgb(image.into_raw(), width, height)
    }
}

impl From<RgbaImage> for Frame {
    fn from(image: RgbaImage) -> Self {
        DynamicImage::from(image).to_rgb8().into()
    }
}

impl From<DynamicImage> for Frame {
    fn from(image: DynamicImage) -> Self {
        image.to_rgb8().into()
    }
}
