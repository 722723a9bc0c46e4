//! Non-solid paint sources.

pub(crate) mod context;
pub(crate) mod filter;

use crate::foundation::core::{Affine, Argb, Point};
use crate::surface::image::Image;

/// How a pattern continues outside its defined area.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Spread {
    /// Extend the edge color.
    #[default]
    Pad,
    /// Tile.
    Repeat,
    /// Tile, mirroring every other tile.
    Reflect,
}

/// Sampling quality hint.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Interpolation {
    /// Nearest texel.
    Nearest,
    /// Bilinear filtering.
    #[default]
    Smooth,
}

/// Color at a position along a gradient.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GradientStop {
    /// Position in `0..=1`; clamped when the gradient is built.
    pub offset: f64,
    /// Straight color at that position.
    pub color: Argb,
}

impl GradientStop {
    /// Create a stop.
    pub fn new(offset: f64, color: Argb) -> Self {
        Self { offset, color }
    }
}

/// Geometry of a [`Pattern`].
#[derive(Clone, Debug)]
pub enum PatternKind {
    /// Image sampled in its own pixel space.
    Texture(Image),
    /// Linear ramp from `start` (offset 0) to `end` (offset 1).
    Linear {
        /// Offset 0.
        start: Point,
        /// Offset 1.
        end: Point,
    },
    /// Circular ramp from `center` (offset 0) to `radius` (offset 1).
    Radial {
        /// Offset 0.
        center: Point,
        /// Distance at offset 1.
        radius: f64,
    },
    /// Angular sweep around `center`, starting at `angle` radians.
    Conical {
        /// Sweep center.
        center: Point,
        /// Angle of offset 0, in radians.
        angle: f64,
    },
}

/// Texture or gradient paint source.
///
/// Patterns are immutable once built; the engine shares them between saved
/// states and in-flight commands.
#[derive(Clone, Debug)]
pub struct Pattern {
    kind: PatternKind,
    stops: Vec<GradientStop>,
    spread: Spread,
    transform: Affine,
}

impl Pattern {
    fn with_kind(kind: PatternKind, stops: Vec<GradientStop>) -> Self {
        Self {
            kind,
            stops,
            spread: Spread::Pad,
            transform: Affine::IDENTITY,
        }
    }

    /// Image pattern.
    pub fn texture(image: Image) -> Self {
        Self::with_kind(PatternKind::Texture(image), Vec::new())
    }

    /// Linear gradient.
    pub fn linear_gradient(start: Point, end: Point, stops: impl Into<Vec<GradientStop>>) -> Self {
        Self::with_kind(PatternKind::Linear { start, end }, stops.into())
    }

    /// Radial gradient.
    pub fn radial_gradient(
        center: Point,
        radius: f64,
        stops: impl Into<Vec<GradientStop>>,
    ) -> Self {
        Self::with_kind(PatternKind::Radial { center, radius }, stops.into())
    }

    /// Conical (angular) gradient.
    pub fn conical_gradient(
        center: Point,
        angle: f64,
        stops: impl Into<Vec<GradientStop>>,
    ) -> Self {
        Self::with_kind(PatternKind::Conical { center, angle }, stops.into())
    }

    /// Replace the spread mode.
    pub fn with_spread(mut self, spread: Spread) -> Self {
        self.spread = spread;
        self
    }

    /// Replace the pattern-to-user transform.
    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    /// Pattern geometry.
    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    /// Gradient stops (empty for textures).
    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Spread mode.
    pub fn spread(&self) -> Spread {
        self.spread
    }

    /// Pattern-to-user transform.
    pub fn transform(&self) -> Affine {
        self.transform
    }
}
