use std::sync::Arc;

use crate::foundation::core::{IntBox, IntPoint};
use crate::foundation::error::{PaintError, PaintResult};

/// Pre-rendered glyph coverage (one byte per pixel).
///
/// Shaping and glyph rendering happen upstream; the engine only places and
/// composites these masks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphBitmap {
    width: u32,
    height: u32,
    bearing: IntPoint,
    coverage: Arc<[u8]>,
}

impl GlyphBitmap {
    /// Create a glyph from row-major coverage.
    ///
    /// `bearing` is the offset of the bitmap's top-left pixel from the pen position.
    pub fn new(width: u32, height: u32, bearing: IntPoint, coverage: Vec<u8>) -> PaintResult<Self> {
        let expected = (width as usize).checked_mul(height as usize);
        if expected != Some(coverage.len()) {
            return Err(PaintError::invalid_argument(format!(
                "glyph {width}x{height} needs {} coverage bytes, got {}",
                width as u64 * height as u64,
                coverage.len()
            )));
        }
        Ok(Self {
            width,
            height,
            bearing,
            coverage: coverage.into(),
        })
    }

    /// Bitmap width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Bitmap height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Top-left offset from the pen position.
    pub fn bearing(&self) -> IntPoint {
        self.bearing
    }

    /// Coverage of row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.coverage[start..start + w]
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Glyph placed at a pen position inside a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedGlyph {
    /// Pen position relative to the run origin.
    pub pen: IntPoint,
    /// The glyph itself.
    pub glyph: GlyphBitmap,
}

/// Sequence of positioned glyph bitmaps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphRun {
    glyphs: Vec<PlacedGlyph>,
}

impl GlyphRun {
    /// Empty run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `glyph` with its pen at `pen`.
    pub fn push(&mut self, pen: IntPoint, glyph: GlyphBitmap) {
        self.glyphs.push(PlacedGlyph { pen, glyph });
    }

    /// Glyphs in drawing order.
    pub fn glyphs(&self) -> &[PlacedGlyph] {
        &self.glyphs
    }

    /// Number of glyphs.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Return `true` when the run holds no glyph.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Bounding box of all non-empty glyphs relative to the run origin.
    pub fn bounds(&self) -> Option<IntBox> {
        self.glyphs
            .iter()
            .filter(|g| !g.glyph.is_empty())
            .map(|g| glyph_box(g, IntPoint::ZERO))
            .reduce(IntBox::union)
    }
}

/// Device box covered by `g` when the run origin is at `origin`.
pub(crate) fn glyph_box(g: &PlacedGlyph, origin: IntPoint) -> IntBox {
    let at = origin
        .offset(g.pen.x, g.pen.y)
        .offset(g.glyph.bearing.x, g.glyph.bearing.y);
    IntBox::from_xywh(at.x, at.y, g.glyph.width as i32, g.glyph.height as i32)
}

impl FromIterator<(IntPoint, GlyphBitmap)> for GlyphRun {
    fn from_iter<I: IntoIterator<Item = (IntPoint, GlyphBitmap)>>(iter: I) -> Self {
        Self {
            glyphs: iter
                .into_iter()
                .map(|(pen, glyph)| PlacedGlyph { pen, glyph })
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/glyph.rs"]
mod tests;
