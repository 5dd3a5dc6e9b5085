//! Raw pixel buffers read back from the X server

use crate::{CaptureError, CaptureResult};

/// Byte order of multi-byte samples in a `PixelBuffer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LsbFirst,
    MsbFirst,
}

/// Z-pixmap image data for a captured rectangle
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    row_stride: usize,
    bytes_per_pixel: usize,
    byte_order: ByteOrder,
}

impl PixelBuffer {
    /// Wrap raw image data, validating that it covers every row
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        row_stride: usize,
        bits_per_pixel: u8,
        byte_order: ByteOrder,
    ) -> CaptureResult<Self> {
        let bytes_per_pixel = match bits_per_pixel {
            8 | 16 | 24 | 32 => bits_per_pixel as usize / 8,
            other => {
                return Err(CaptureError::UnsupportedFormat(format!(
                    "{} bits per pixel",
                    other
                )))
            }
        };

        if row_stride < width as usize * bytes_per_pixel {
            return Err(CaptureError::Read(format!(
                "row stride {} too small for {} pixels",
                row_stride, width
            )));
        }

        let needed = row_stride * height as usize;
        if data.len() < needed {
            return Err(CaptureError::Read(format!(
                "expected {} bytes of image data, got {}",
                needed,
                data.len()
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            row_stride,
            bytes_per_pixel,
            byte_order,
        })
    }

    /// Build a tightly packed 32bpp buffer from samples in row-major order
    pub fn from_samples(width: u32, height: u32, samples: &[u32]) -> CaptureResult<Self> {
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::new(data, width, height, width as usize * 4, 32, ByteOrder::LsbFirst)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Packed sample at (x, y)
    #[inline]
    pub fn sample(&self, x: u32, y: u32) -> u32 {
        let offset = y as usize * self.row_stride + x as usize * self.bytes_per_pixel;
        let bytes = &self.data[offset..offset + self.bytes_per_pixel];

        match self.byte_order {
            ByteOrder::LsbFirst => bytes
                .iter()
                .rev()
                .fold(0u32, |acc, &b| (acc << 8) | b as u32),
            ByteOrder::MsbFirst => bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32),
        }
    }

    /// Iterate the packed samples of one row
    pub fn row_samples(&self, y: u32) -> impl Iterator<Item = u32> + '_ {
        (0..self.width).map(move |x| self.sample(x, y))
    }
}
