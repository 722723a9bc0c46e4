use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::foundation::core::IntBox;
use crate::foundation::error::{PaintError, PaintResult};
use crate::foundation::math::{channel, demultiply, pack, premultiply};
use crate::surface::format::PixelFormat;

/// Largest accepted width or height.
pub const MAX_IMAGE_DIMENSION: u32 = 1 << 16;

/// Shared pixel buffer.
///
/// Cloning an `Image` is cheap and yields another handle to the same pixels.
/// Pixels are stored as relaxed atomics: rendering workers write disjoint rows
/// concurrently, and the engine's flush barrier orders those writes before any
/// later read by the caller.
#[derive(Clone)]
pub struct Image {
    data: Arc<ImageData>,
}

struct ImageData {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Box<[AtomicU32]>,
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.data.width)
            .field("height", &self.data.height)
            .field("format", &self.data.format)
            .finish_non_exhaustive()
    }
}

fn checked_len(width: u32, height: u32) -> PaintResult<usize> {
    if width == 0 || height == 0 {
        return Err(PaintError::invalid_argument(format!(
            "image size must be non-zero, got {width}x{height}"
        )));
    }
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(PaintError::invalid_argument(format!(
            "image size {width}x{height} exceeds {MAX_IMAGE_DIMENSION}"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| PaintError::out_of_memory("image size overflows usize"))
}

fn alloc_cells(len: usize, mut init: impl FnMut(usize) -> u32) -> PaintResult<Box<[AtomicU32]>> {
    let mut cells = Vec::new();
    cells
        .try_reserve_exact(len)
        .map_err(|e| PaintError::out_of_memory(format!("pixel buffer of {len} cells: {e}")))?;
    cells.extend((0..len).map(|i| AtomicU32::new(init(i))));
    Ok(cells.into_boxed_slice())
}

impl Image {
    /// Create a zero-filled image.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> PaintResult<Self> {
        let len = checked_len(width, height)?;
        Ok(Self {
            data: Arc::new(ImageData {
                width,
                height,
                format,
                pixels: alloc_cells(len, |_| 0)?,
            }),
        })
    }

    /// Create an image from row-major cells already in `format`.
    pub fn from_pixels(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: &[u32],
    ) -> PaintResult<Self> {
        let len = checked_len(width, height)?;
        if pixels.len() != len {
            return Err(PaintError::invalid_argument(format!(
                "expected {len} pixels for {width}x{height}, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            data: Arc::new(ImageData {
                width,
                height,
                format,
                pixels: alloc_cells(len, |i| pixels[i])?,
            }),
        })
    }

    /// Convert an 8-bit straight RGBA buffer into a premultiplied image.
    pub fn from_rgba_image(img: &image::RgbaImage) -> PaintResult<Self> {
        let (w, h) = img.dimensions();
        let len = checked_len(w, h)?;
        let raw = img.as_raw();
        let cells = alloc_cells(len, |i| {
            let p = &raw[i * 4..i * 4 + 4];
            premultiply(pack(
                u32::from(p[3]),
                u32::from(p[0]),
                u32::from(p[1]),
                u32::from(p[2]),
            ))
        })?;
        Ok(Self {
            data: Arc::new(ImageData {
                width: w,
                height: h,
                format: PixelFormat::Prgb32,
                pixels: cells,
            }),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.data.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.data.height
    }

    /// Pixel format.
    pub fn format(&self) -> PixelFormat {
        self.data.format
    }

    /// Full image bounds.
    pub fn bounds(&self) -> IntBox {
        IntBox::new(0, 0, self.data.width as i32, self.data.height as i32)
    }

    /// Return `true` when both handles refer to the same pixels.
    pub fn ptr_eq(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Stored cell at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.data.width || y >= self.data.height {
            return None;
        }
        let i = y as usize * self.data.width as usize + x as usize;
        Some(self.data.pixels[i].load(Ordering::Relaxed))
    }

    /// Overwrite the stored cell at `(x, y)`; ignored outside the image.
    pub fn set_pixel(&self, x: u32, y: u32, value: u32) {
        if x < self.data.width && y < self.data.height {
            let i = y as usize * self.data.width as usize + x as usize;
            self.data.pixels[i].store(value, Ordering::Relaxed);
        }
    }

    /// Fill every cell with `value`.
    pub fn fill(&self, value: u32) {
        for px in self.data.pixels.iter() {
            px.store(value, Ordering::Relaxed);
        }
    }

    /// Snapshot all cells in row-major order.
    pub fn to_vec(&self) -> Vec<u32> {
        self.data
            .pixels
            .iter()
            .map(|p| p.load(Ordering::Relaxed))
            .collect()
    }

    /// Export as straight 8-bit RGBA.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let format = self.data.format;
        image::RgbaImage::from_fn(self.data.width, self.data.height, |x, y| {
            let px = demultiply(format.load(self.pixel(x, y).unwrap_or(0)));
            image::Rgba([
                channel(px, 16) as u8,
                channel(px, 8) as u8,
                channel(px, 0) as u8,
                channel(px, 24) as u8,
            ])
        })
    }

    /// Write the image as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> PaintResult<()> {
        self.to_rgba_image()
            .save_with_format(path.as_ref(), image::ImageFormat::Png)
            .map_err(|e| PaintError::Other(anyhow::Error::new(e)))
    }

    /// Row `y` as atomic cells. `y` must be inside the image.
    pub(crate) fn row(&self, y: i32) -> &[AtomicU32] {
        let w = self.data.width as usize;
        let start = y as usize * w;
        &self.data.pixels[start..start + w]
    }
}

/// Paint target: the image plus its cached geometry.
///
/// Built once per engine and shared read-only with every command.
#[derive(Debug)]
pub(crate) struct Layer {
    pub(crate) image: Image,
    pub(crate) format: PixelFormat,
    pub(crate) width: i32,
    pub(crate) height: i32,
}

impl Layer {
    pub(crate) fn new(image: Image) -> PaintResult<Self> {
        let format = image.format();
        if !format.is_paintable() {
            return Err(PaintError::UnsupportedFormat(format));
        }
        Ok(Self {
            format,
            width: image.width() as i32,
            height: image.height() as i32,
            image,
        })
    }

    pub(crate) fn bounds(&self) -> IntBox {
        IntBox::new(0, 0, self.width, self.height)
    }

    pub(crate) fn row(&self, y: i32) -> &[AtomicU32] {
        self.image.row(y)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/image.rs"]
mod tests;
