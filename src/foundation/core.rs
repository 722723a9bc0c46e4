pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Integer pixel position.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct IntPoint {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

impl IntPoint {
    /// Origin `(0, 0)`.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise saturating add.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Half-open integer pixel box `[x0, x1) x [y0, y1)`.
///
/// A box is valid when it covers at least one pixel. Operations that can
/// produce an empty result return `Option` instead of a degenerate box.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct IntBox {
    /// Left edge (inclusive).
    pub x0: i32,
    /// Top edge (inclusive).
    pub y0: i32,
    /// Right edge (exclusive).
    pub x1: i32,
    /// Bottom edge (exclusive).
    pub y1: i32,
}

impl IntBox {
    /// Create a box from its edges.
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Create a box from position and size.
    pub fn from_xywh(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x.saturating_add(w),
            y1: y.saturating_add(h),
        }
    }

    /// Width in pixels (zero for inverted boxes).
    pub fn width(self) -> i32 {
        (self.x1 - self.x0).max(0)
    }

    /// Height in pixels (zero for inverted boxes).
    pub fn height(self) -> i32 {
        (self.y1 - self.y0).max(0)
    }

    /// Return `true` when the box covers at least one pixel.
    pub fn is_valid(self) -> bool {
        self.x0 < self.x1 && self.y0 < self.y1
    }

    /// Intersection of two boxes, `None` when they do not overlap.
    pub fn intersect(self, other: IntBox) -> Option<IntBox> {
        let b = IntBox {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        b.is_valid().then_some(b)
    }

    /// Smallest box containing both boxes.
    pub fn union(self, other: IntBox) -> IntBox {
        IntBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Translate by `(dx, dy)` using saturating arithmetic.
    pub fn translate(self, dx: i32, dy: i32) -> IntBox {
        IntBox {
            x0: self.x0.saturating_add(dx),
            y0: self.y0.saturating_add(dy),
            x1: self.x1.saturating_add(dx),
            y1: self.y1.saturating_add(dy),
        }
    }

    /// Return `true` when pixel `(x, y)` lies inside the box.
    pub fn contains(self, x: i32, y: i32) -> bool {
        self.x0 <= x && x < self.x1 && self.y0 <= y && y < self.y1
    }

    /// Return `true` when `other` lies fully inside this box.
    pub fn contains_box(self, other: IntBox) -> bool {
        self.x0 <= other.x0 && self.y0 <= other.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }

    /// Convert to a floating-point rectangle.
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x0),
            f64::from(self.y0),
            f64::from(self.x1),
            f64::from(self.y1),
        )
    }
}

/// Straight (non-premultiplied) color packed as `0xAARRGGBB`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Argb(pub u32);

impl Argb {
    /// Opaque black, the default solid source.
    pub const OPAQUE_BLACK: Self = Self(0xFF00_0000);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self(0);

    /// Pack channels into a color.
    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    /// Alpha channel.
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Red channel.
    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Green channel.
    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Blue channel.
    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Premultiplied `0xAARRGGBB` value of this color.
    pub fn premultiplied(self) -> u32 {
        crate::foundation::math::premultiply(self.0)
    }
}

/// Round `v` onto the 1/256 pixel grid and report whether it is a whole pixel.
pub(crate) fn is_pixel_aligned(v: f64) -> bool {
    v.is_finite() && ((v * 256.0).round() as i64) & 0xFF == 0
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
