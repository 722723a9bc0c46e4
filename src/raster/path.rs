use kurbo::{PathEl, Stroke, StrokeOpts};

use crate::foundation::core::{Affine, BezPath, Point};

/// Device-space flattening tolerance in pixels.
pub(crate) const FLATTEN_TOLERANCE: f64 = 0.25;

/// Polylines ready for rasterization. Every contour is implicitly closed.
#[derive(Clone, Debug, Default)]
pub struct FlatPath {
    points: Vec<Point>,
    ends: Vec<usize>,
}

impl FlatPath {
    /// Empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all contours, keeping allocations.
    pub fn clear(&mut self) {
        self.points.clear();
        self.ends.clear();
    }

    /// Return `true` when no point was added.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Start a new contour at `p`.
    pub fn move_to(&mut self, p: Point) {
        self.close();
        self.points.push(p);
    }

    /// Extend the current contour to `p`.
    pub fn line_to(&mut self, p: Point) {
        if self.open_len() == 0 {
            self.points.push(p);
            return;
        }
        if self.points.last() != Some(&p) {
            self.points.push(p);
        }
    }

    /// Finish the current contour.
    pub fn close(&mut self) {
        if self.open_len() > 0 {
            self.ends.push(self.points.len());
        }
    }

    /// Closed contours as point slices.
    pub fn contours(&self) -> impl Iterator<Item = &[Point]> + '_ {
        let mut start = 0;
        let open = (self.open_len() > 0).then_some(self.points.len());
        self.ends.iter().copied().chain(open).map(move |end| {
            let c = &self.points[start..end];
            start = end;
            c
        })
    }

    /// Flatten `path` in its own space with `tolerance`, mapping points through `transform`.
    pub fn append_bez(&mut self, path: &BezPath, transform: Affine, tolerance: f64) {
        kurbo::flatten(path.elements().iter().copied(), tolerance, |el| match el {
            PathEl::MoveTo(p) => self.move_to(transform * p),
            PathEl::LineTo(p) => self.line_to(transform * p),
            PathEl::ClosePath => self.close(),
            PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
        });
        self.close();
    }

    fn open_len(&self) -> usize {
        self.points.len() - self.ends.last().copied().unwrap_or(0)
    }
}

/// User-space tolerance that yields [`FLATTEN_TOLERANCE`] after scaling.
pub(crate) fn user_tolerance(approximation_scale: f64) -> f64 {
    if approximation_scale.is_finite() && approximation_scale > 0.0 {
        FLATTEN_TOLERANCE / approximation_scale
    } else {
        FLATTEN_TOLERANCE
    }
}

/// Flatten a fill path into device space.
pub(crate) fn flatten_fill(
    path: &BezPath,
    transform: Affine,
    approximation_scale: f64,
    out: &mut FlatPath,
) {
    out.clear();
    out.append_bez(path, transform, user_tolerance(approximation_scale));
}

/// Expand `path` into its stroke outline, then flatten into device space.
pub(crate) fn flatten_stroke(
    path: &BezPath,
    stroke: &Stroke,
    transform: Affine,
    approximation_scale: f64,
    out: &mut FlatPath,
) {
    let tolerance = user_tolerance(approximation_scale);
    let outline = kurbo::stroke(
        path.elements().iter().copied(),
        stroke,
        &StrokeOpts::default(),
        tolerance,
    );
    out.clear();
    out.append_bez(&outline, transform, tolerance);
}

#[cfg(test)]
#[path = "../../tests/unit/raster/path.rs"]
mod tests;
