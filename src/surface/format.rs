use crate::foundation::math::{demultiply, premultiply};

/// Pixel layout of an [`Image`](crate::Image).
///
/// Every format is stored in 32-bit cells. `A8` keeps its alpha in the low byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PixelFormat {
    /// Premultiplied `0xAARRGGBB`.
    Prgb32,
    /// Straight-alpha `0xAARRGGBB`.
    Argb32,
    /// `0xFFRRGGBB`; alpha is ignored on read and forced opaque on write.
    Xrgb32,
    /// Alpha-only. Usable as a blit source, not as a paint target.
    A8,
}

impl PixelFormat {
    /// Bytes per pixel in the format's packed representation.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::A8 => 1,
            _ => 4,
        }
    }

    /// Return `true` when a [`PaintEngine`](crate::PaintEngine) can render into this format.
    pub fn is_paintable(self) -> bool {
        !matches!(self, PixelFormat::A8)
    }

    /// Convert a stored cell into premultiplied ARGB.
    #[inline]
    pub(crate) fn load(self, raw: u32) -> u32 {
        match self {
            PixelFormat::Prgb32 => raw,
            PixelFormat::Argb32 => premultiply(raw),
            PixelFormat::Xrgb32 => raw | 0xFF00_0000,
            PixelFormat::A8 => (raw & 0xFF) << 24,
        }
    }

    /// Convert premultiplied ARGB into a stored cell.
    #[inline]
    pub(crate) fn store(self, prgb: u32) -> u32 {
        match self {
            PixelFormat::Prgb32 => prgb,
            PixelFormat::Argb32 => demultiply(prgb),
            PixelFormat::Xrgb32 => prgb | 0xFF00_0000,
            PixelFormat::A8 => prgb >> 24,
        }
    }
}
