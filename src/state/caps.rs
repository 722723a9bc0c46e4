use std::f64::consts::FRAC_1_SQRT_2;
use std::sync::Arc;

use kurbo::{Cap, Join, Stroke};

use crate::composite::operator::Operator;
use crate::foundation::core::{Affine, Argb, IntPoint, is_pixel_aligned};
use crate::foundation::math::fuzzy_eq;
use crate::pattern::filter::ColorFilter;
use crate::pattern::{Interpolation, Pattern};
use crate::raster::rasterizer::FillRule;

/// Solid color kept in both straight and premultiplied form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolidColor {
    argb: Argb,
    prgb: u32,
}

impl SolidColor {
    /// Wrap a straight color.
    pub fn new(argb: Argb) -> Self {
        Self {
            argb,
            prgb: argb.premultiplied(),
        }
    }

    /// The straight color.
    pub fn argb(self) -> Argb {
        self.argb
    }

    /// The premultiplied `0xAARRGGBB` value.
    pub fn premultiplied(self) -> u32 {
        self.prgb
    }
}

impl From<Argb> for SolidColor {
    fn from(argb: Argb) -> Self {
        Self::new(argb)
    }
}

/// What the engine paints with.
#[derive(Clone, Debug)]
pub enum Source {
    /// Uniform color.
    Solid(SolidColor),
    /// Texture or gradient.
    Pattern(Arc<Pattern>),
    /// Color matrix applied to the destination.
    Filter(Arc<ColorFilter>),
}

impl Default for Source {
    fn default() -> Self {
        Source::solid(Argb::OPAQUE_BLACK)
    }
}

impl Source {
    /// Solid color source.
    pub fn solid(argb: Argb) -> Self {
        Source::Solid(SolidColor::new(argb))
    }
}

/// Fast-path class of the final transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TransformKind {
    /// Identity linear part, whole-pixel translation.
    ExactTranslate,
    /// Identity linear part, fractional translation.
    SubpixelTranslate,
    Affine,
}

/// Everything besides clipping that shapes how a draw call paints.
#[derive(Clone, Debug)]
pub(crate) struct CapsState {
    pub(crate) op: Operator,
    pub(crate) source: Source,
    pub(crate) fill_rule: FillRule,
    pub(crate) stroke: Stroke,
    pub(crate) interpolation: Interpolation,

    // Transform as set by the caller, relative to the work origin.
    pub(crate) user_transform: Affine,
    pub(crate) transform: Affine,
    pub(crate) transform_kind: TransformKind,
    // Whole-pixel translation, meaningful for `ExactTranslate`.
    pub(crate) translation: IntPoint,
    pub(crate) approximation_scale: f64,
}

impl Default for CapsState {
    fn default() -> Self {
        Self {
            op: Operator::SrcOver,
            source: Source::default(),
            fill_rule: FillRule::NonZero,
            stroke: Stroke::new(1.0)
                .with_caps(Cap::Butt)
                .with_join(Join::Miter),
            interpolation: Interpolation::Smooth,
            user_transform: Affine::IDENTITY,
            transform: Affine::IDENTITY,
            transform_kind: TransformKind::ExactTranslate,
            translation: IntPoint::ZERO,
            approximation_scale: 1.0,
        }
    }
}

impl CapsState {
    /// Recompute the final transform and its classification.
    pub(crate) fn update_transform(&mut self, work_origin: IntPoint) {
        let origin = Affine::translate((f64::from(work_origin.x), f64::from(work_origin.y)));
        self.transform = origin * self.user_transform;

        let [a, b, c, d, e, f] = self.transform.as_coeffs();
        let linear_identity =
            fuzzy_eq(a, 1.0) && fuzzy_eq(b, 0.0) && fuzzy_eq(c, 0.0) && fuzzy_eq(d, 1.0);
        if linear_identity {
            self.approximation_scale = 1.0;
            if is_pixel_aligned(e) && is_pixel_aligned(f) {
                self.transform_kind = TransformKind::ExactTranslate;
                self.translation = IntPoint::new(e.round() as i32, f.round() as i32);
            } else {
                self.transform_kind = TransformKind::SubpixelTranslate;
                self.translation = IntPoint::ZERO;
            }
        } else {
            self.transform_kind = TransformKind::Affine;
            self.translation = IntPoint::ZERO;
            let x = a + c;
            let y = b + d;
            self.approximation_scale = (x * x + y * y).sqrt() * FRAC_1_SQRT_2;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/state/caps.rs"]
mod tests;
