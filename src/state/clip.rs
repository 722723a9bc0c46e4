use crate::foundation::core::{IntBox, IntPoint};
use crate::geometry::region::Region;

/// Clip configuration and the work clip derived from it.
///
/// Meta variables come from the owner of the surface, user variables from
/// the caller. Both regions are optional; `None` means unrestricted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ClipState {
    pub(crate) meta_origin: IntPoint,
    pub(crate) meta_region: Option<Region>,
    pub(crate) user_origin: IntPoint,
    pub(crate) user_region: Option<Region>,

    pub(crate) work_origin: IntPoint,
    pub(crate) work_region: Region,
    // Bounding box of `work_region`; invalid when the region is empty.
    pub(crate) clip_box: IntBox,
    pub(crate) clip_simple: bool,
}

impl ClipState {
    pub(crate) fn new(layer_bounds: IntBox) -> Self {
        Self {
            meta_origin: IntPoint::ZERO,
            meta_region: None,
            user_origin: IntPoint::ZERO,
            user_region: None,
            work_origin: IntPoint::ZERO,
            work_region: Region::from_box(layer_bounds),
            clip_box: layer_bounds,
            clip_simple: true,
        }
    }

    /// Recompute the work origin, region and box.
    ///
    /// Returns `true` when the work origin moved; the caller must then
    /// re-anchor the transform.
    pub(crate) fn update_work_region(&mut self, layer_bounds: IntBox) -> bool {
        let mo = self.meta_origin;
        let composed = match (&self.meta_region, &self.user_region) {
            (Some(meta), Some(user)) => user.translate(mo.x, mo.y).intersect(meta),
            (Some(meta), None) => meta.clone(),
            (None, Some(user)) => user.translate(mo.x, mo.y),
            (None, None) => Region::from_box(layer_bounds),
        };
        self.work_region = composed.intersect_box(layer_bounds);
        self.clip_box = self.work_region.extents().unwrap_or_default();
        self.clip_simple = self.work_region.is_rect();

        let origin = mo.offset(self.user_origin.x, self.user_origin.y);
        let moved = origin != self.work_origin;
        self.work_origin = origin;
        moved
    }

    /// Return `true` when nothing can be painted.
    pub(crate) fn is_empty(&self) -> bool {
        !self.clip_box.is_valid()
    }

    /// Clip boxes of row `y`.
    pub(crate) fn row_boxes(&self, y: i32) -> &[IntBox] {
        if self.clip_simple {
            if self.clip_box.y0 <= y && y < self.clip_box.y1 {
                return std::slice::from_ref(&self.clip_box);
            }
            return &[];
        }
        self.work_region.row_boxes(y)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/state/clip.rs"]
mod tests;
