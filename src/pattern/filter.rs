use crate::foundation::error::{PaintError, PaintResult};
use crate::foundation::math::{channel, demultiply, pack, premultiply};

/// Color matrix source: rewrites destination pixels instead of painting over them.
///
/// Row `i` computes output channel `i` (red, green, blue, alpha) from the straight
/// input `[r, g, b, a, 1]`, all channels normalized to `0..=1`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorFilter {
    matrix: [[f32; 5]; 4],
}

impl ColorFilter {
    /// Filter from an explicit matrix. Every entry must be finite.
    pub fn new(matrix: [[f32; 5]; 4]) -> PaintResult<Self> {
        if matrix.iter().flatten().any(|v| !v.is_finite()) {
            return Err(PaintError::invalid_argument("color matrix must be finite"));
        }
        Ok(Self { matrix })
    }

    /// Filter that leaves colors unchanged.
    pub fn identity() -> Self {
        Self {
            matrix: [
                [1.0, 0.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 0.0, 1.0, 0.0],
            ],
        }
    }

    /// Rec. 709 luminance.
    pub fn grayscale() -> Self {
        let l = [0.2126, 0.7152, 0.0722, 0.0, 0.0];
        Self {
            matrix: [l, l, l, [0.0, 0.0, 0.0, 1.0, 0.0]],
        }
    }

    /// Invert color channels, keep alpha.
    pub fn invert() -> Self {
        Self {
            matrix: [
                [-1.0, 0.0, 0.0, 0.0, 1.0],
                [0.0, -1.0, 0.0, 0.0, 1.0],
                [0.0, 0.0, -1.0, 0.0, 1.0],
                [0.0, 0.0, 0.0, 1.0, 0.0],
            ],
        }
    }

    /// Matrix rows.
    pub fn matrix(&self) -> &[[f32; 5]; 4] {
        &self.matrix
    }

    /// Filter one premultiplied pixel.
    pub(crate) fn apply(&self, prgb: u32) -> u32 {
        let px = demultiply(prgb);
        let input = [
            channel(px, 16) as f32 / 255.0,
            channel(px, 8) as f32 / 255.0,
            channel(px, 0) as f32 / 255.0,
            channel(px, 24) as f32 / 255.0,
            1.0,
        ];
        let out = self.matrix.map(|row| {
            let v: f32 = row.iter().zip(input).map(|(m, c)| m * c).sum();
            (v.clamp(0.0, 1.0) * 255.0).round() as u32
        });
        premultiply(pack(out[3], out[0], out[1], out[2]))
    }
}

impl Default for ColorFilter {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pattern/filter.rs"]
mod tests;
