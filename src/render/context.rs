use std::sync::Arc;

use crate::foundation::core::BezPath;
use crate::pattern::context::PatternContext;
use crate::raster::path::{FlatPath, flatten_fill, flatten_stroke};
use crate::raster::pool::{PooledRasterizer, RasterizerPool};
use crate::raster::rasterizer::FillRule;
use crate::raster::scanline::Scanline;
use crate::state::caps::CapsState;
use crate::state::clip::ClipState;
use crate::surface::image::Layer;

/// How a path turns into coverage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PathMode {
    Fill(FillRule),
    Stroke,
}

/// Rendering state owned by one thread.
///
/// The engine's main context renders every row and carries the engine's
/// current clip and caps. A worker context owns rows
/// `y % delta == offset` and rebinds clip, caps and pattern to each command
/// it executes.
pub(crate) struct RenderContext {
    pub(crate) offset: i32,
    pub(crate) delta: i32,

    pub(crate) layer: Arc<Layer>,
    pub(crate) clip: Arc<ClipState>,
    pub(crate) caps: Arc<CapsState>,
    pub(crate) pattern: Option<Arc<PatternContext>>,

    pub(crate) scanline: Scanline,
    pub(crate) scratch: Scanline,
    pub(crate) flat: FlatPath,
    // Fetched source pixels; grows geometrically, never shrinks.
    pub(crate) buffer: Vec<u32>,
}

impl RenderContext {
    /// Single-threaded context that renders every row.
    pub(crate) fn main(layer: Arc<Layer>, clip: Arc<ClipState>, caps: Arc<CapsState>) -> Self {
        Self {
            offset: 0,
            delta: 1,
            layer,
            clip,
            caps,
            pattern: None,
            scanline: Scanline::new(),
            scratch: Scanline::new(),
            flat: FlatPath::new(),
            buffer: Vec::new(),
        }
    }

    /// Context for worker `id` of `delta`.
    pub(crate) fn worker(id: usize, delta: usize, template: &RenderContext) -> Self {
        Self {
            offset: id as i32,
            delta: delta as i32,
            ..Self::main(
                Arc::clone(&template.layer),
                Arc::clone(&template.clip),
                Arc::clone(&template.caps),
            )
        }
    }

    /// Point this context at a command's state snapshot.
    pub(crate) fn bind(
        &mut self,
        clip: &Arc<ClipState>,
        caps: &Arc<CapsState>,
        pattern: Option<&Arc<PatternContext>>,
    ) {
        if !Arc::ptr_eq(&self.clip, clip) {
            self.clip = Arc::clone(clip);
        }
        if !Arc::ptr_eq(&self.caps, caps) {
            self.caps = Arc::clone(caps);
        }
        let same_pattern = match (&self.pattern, pattern) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same_pattern {
            self.pattern = pattern.cloned();
        }
    }

    /// Flatten and rasterize `path` against the bound clip and caps.
    ///
    /// Returns `None` when the path covers no pixel inside the clip box.
    pub(crate) fn rasterize(
        &mut self,
        path: &BezPath,
        mode: PathMode,
        pool: &Arc<RasterizerPool>,
    ) -> Option<PooledRasterizer> {
        if self.clip.is_empty() {
            return None;
        }
        let caps = &self.caps;
        let rule = match mode {
            PathMode::Fill(rule) => {
                flatten_fill(path, caps.transform, caps.approximation_scale, &mut self.flat);
                rule
            }
            PathMode::Stroke => {
                flatten_stroke(
                    path,
                    &caps.stroke,
                    caps.transform,
                    caps.approximation_scale,
                    &mut self.flat,
                );
                FillRule::NonZero
            }
        };
        if self.flat.is_empty() {
            return None;
        }

        let mut ras = pool.borrow();
        ras.set_clip_box(self.clip.clip_box);
        ras.set_fill_rule(rule);
        ras.add_path(&self.flat);
        ras.finalize();
        let ras = PooledRasterizer::new(ras, Arc::clone(pool));
        ras.has_cells().then_some(ras)
    }
}

/// Borrow the first `len` cells of `buf`, growing it to the next power of two.
pub(crate) fn scratch_row(buf: &mut Vec<u32>, len: usize) -> &mut [u32] {
    if buf.len() < len {
        buf.resize(len.next_power_of_two(), 0);
    }
    &mut buf[..len]
}

#[cfg(test)]
#[path = "../../tests/unit/render/context.rs"]
mod tests;
