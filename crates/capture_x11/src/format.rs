//! Channel layout of packed pixel samples

use crate::{CaptureError, CaptureResult};

/// Mask and shift for one colour channel.
///
/// `shift` is signed: positive values move the masked bits right, negative
/// values move them left so channels narrower than 8 bits fill the high bits
/// of the output byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMask {
    pub mask: u32,
    pub shift: i32,
}

impl ChannelMask {
    /// Derive the shift that maps the top 8 bits of `mask` onto 0..=255.
    pub fn from_mask(mask: u32) -> Option<Self> {
        if mask == 0 {
            return None;
        }

        let shift = mask.trailing_zeros() as i32 + mask.count_ones() as i32 - 8;
        Some(Self { mask, shift })
    }

    /// Extract this channel from a packed sample
    #[inline]
    pub fn extract(&self, sample: u32) -> u8 {
        let bits = sample & self.mask;
        let value = if self.shift >= 0 {
            bits >> self.shift
        } else {
            bits << -self.shift
        };
        (value & 0xFF) as u8
    }
}

/// Per-channel descriptors for a capture surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub red: ChannelMask,
    pub green: ChannelMask,
    pub blue: ChannelMask,
}

impl PixelFormat {
    /// 32-bit `0x00RRGGBB` words, the usual depth-24/32 TrueColor layout.
    pub const XRGB8888: PixelFormat = PixelFormat {
        red: ChannelMask { mask: 0x00FF_0000, shift: 16 },
        green: ChannelMask { mask: 0x0000_FF00, shift: 8 },
        blue: ChannelMask { mask: 0x0000_00FF, shift: 0 },
    };

    /// Build a format from visual channel masks
    pub fn from_masks(red: u32, green: u32, blue: u32) -> CaptureResult<Self> {
        let channel = |name: &str, mask: u32| {
            ChannelMask::from_mask(mask).ok_or_else(|| {
                CaptureError::UnsupportedFormat(format!("{} mask is empty", name))
            })
        };

        Ok(Self {
            red: channel("red", red)?,
            green: channel("green", green)?,
            blue: channel("blue", blue)?,
        })
    }

    /// Split a packed sample into 8-bit R, G, B
    #[inline]
    pub fn rgb(&self, sample: u32) -> [u8; 3] {
        [
            self.red.extract(sample),
            self.green.extract(sample),
            self.blue.extract(sample),
        ]
    }
}
