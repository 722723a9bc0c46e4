//! Pixel writers for every command kind.
//!
//! Each writer walks only the rows owned by its context, starting at the first
//! row `>= y0` with `y % delta == offset`. The single-threaded context has
//! `delta == 1` and therefore writes every row.

use std::sync::atomic::Ordering;

use crate::composite::funcs::CompositeFuncs;
use crate::foundation::core::{IntBox, IntPoint};
use crate::foundation::math::align_to_delta;
use crate::pattern::context::PatternContext;
use crate::pattern::filter::ColorFilter;
use crate::raster::rasterizer::Rasterizer;
use crate::raster::scanline::SpanCoverage;
use crate::render::context::{RenderContext, scratch_row};
use crate::state::caps::{CapsState, Source};
use crate::surface::image::{Image, Layer};
use crate::text::glyph::GlyphRun;

enum Fill<'a> {
    Solid(u32),
    Fetch(&'a PatternContext),
    Filter(&'a ColorFilter),
}

impl<'a> Fill<'a> {
    // `None` when a pattern source has no fetch context.
    fn resolve(caps: &'a CapsState, pattern: Option<&'a PatternContext>) -> Option<Self> {
        match &caps.source {
            Source::Solid(color) => Some(Fill::Solid(color.premultiplied())),
            Source::Pattern(_) => pattern.map(Fill::Fetch),
            Source::Filter(f) => Some(Fill::Filter(f)),
        }
    }
}

struct SpanWriter<'a> {
    layer: &'a Layer,
    funcs: CompositeFuncs,
    fill: Fill<'a>,
    buffer: &'a mut Vec<u32>,
}

impl SpanWriter<'_> {
    fn span(&mut self, y: i32, x: i32, len: i32, cov: SpanCoverage<'_>) {
        let row = self.layer.row(y);
        let dst = &row[x as usize..(x + len) as usize];
        match self.fill {
            Fill::Solid(c) => self.funcs.cspan(dst, c, cov),
            Fill::Fetch(p) => {
                let src = scratch_row(self.buffer, len as usize);
                p.fetch(src, x, y);
                self.funcs.vspan(dst, src, cov);
            }
            Fill::Filter(f) => self.funcs.filter_span(dst, f, cov),
        }
    }
}

impl RenderContext {
    /// Fill integer boxes that already lie inside the clip.
    pub(crate) fn render_boxes(&mut self, boxes: impl IntoIterator<Item = IntBox>) {
        let Some(fill) = Fill::resolve(&self.caps, self.pattern.as_deref()) else {
            return;
        };
        let mut w = SpanWriter {
            layer: &self.layer,
            funcs: CompositeFuncs::get(self.layer.format, self.caps.op),
            fill,
            buffer: &mut self.buffer,
        };
        for b in boxes {
            let mut y = align_to_delta(b.y0, self.offset, self.delta);
            while y < b.y1 {
                w.span(y, b.x0, b.width(), SpanCoverage::Solid(0xFF));
                y += self.delta;
            }
        }
    }

    /// Composite the part of `image` that lands on `dst`.
    ///
    /// `src` is the image pixel drawn at `dst`'s top-left corner; `dst` must
    /// lie inside both the clip box and the image once shifted by `src`.
    pub(crate) fn render_image(&mut self, dst: IntBox, src: IntPoint, image: &Image) {
        let funcs = CompositeFuncs::get(self.layer.format, self.caps.op);
        let format = image.format();
        let mut y = align_to_delta(dst.y0, self.offset, self.delta);
        while y < dst.y1 {
            let src_row = image.row(src.y + (y - dst.y0));
            let dst_row = self.layer.row(y);
            for cb in self.clip.row_boxes(y) {
                let x0 = dst.x0.max(cb.x0);
                let x1 = dst.x1.min(cb.x1);
                if x0 >= x1 {
                    continue;
                }
                let sx = (src.x + (x0 - dst.x0)) as usize;
                let len = (x1 - x0) as usize;
                let buf = scratch_row(&mut self.buffer, len);
                for (px, cell) in buf.iter_mut().zip(&src_row[sx..sx + len]) {
                    *px = format.load(cell.load(Ordering::Relaxed));
                }
                funcs.vspan(
                    &dst_row[x0 as usize..x1 as usize],
                    buf,
                    SpanCoverage::Solid(0xFF),
                );
            }
            y += self.delta;
        }
    }

    /// Paint the current source through a finalized rasterizer.
    pub(crate) fn render_path(&mut self, ras: &Rasterizer) {
        self.render_coverage(ras, None);
    }

    /// Paint `texture` through a finalized rasterizer, ignoring the source.
    pub(crate) fn render_texture(&mut self, ras: &Rasterizer, texture: &PatternContext) {
        self.render_coverage(ras, Some(texture));
    }

    fn render_coverage(&mut self, ras: &Rasterizer, texture: Option<&PatternContext>) {
        let fill = match texture {
            Some(t) => Fill::Fetch(t),
            None => match Fill::resolve(&self.caps, self.pattern.as_deref()) {
                Some(fill) => fill,
                None => return,
            },
        };
        let Some(bounds) = ras.bounds().and_then(|b| b.intersect(self.clip.clip_box)) else {
            return;
        };
        let mut w = SpanWriter {
            layer: &self.layer,
            funcs: CompositeFuncs::get(self.layer.format, self.caps.op),
            fill,
            buffer: &mut self.buffer,
        };
        let clip = &self.clip;
        let mut y = align_to_delta(bounds.y0, self.offset, self.delta);
        while y < bounds.y1 {
            let produced = if clip.clip_simple {
                ras.sweep_scanline(&mut self.scanline, y)
            } else {
                ras.sweep_scanline_clipped(
                    &mut self.scanline,
                    &mut self.scratch,
                    y,
                    clip.row_boxes(y),
                )
            };
            if produced {
                for s in self.scanline.spans() {
                    w.span(y, s.x, s.len, s.coverage);
                }
            }
            y += self.delta;
        }
    }

    /// Composite glyph masks placed at device positions.
    ///
    /// Each placement names a glyph of `run` by index and the device pixel of
    /// its bitmap's top-left corner. Nothing outside `bounds` is written.
    pub(crate) fn render_glyphs(
        &mut self,
        run: &GlyphRun,
        placements: impl IntoIterator<Item = (usize, IntPoint)>,
        bounds: IntBox,
    ) {
        let Some(fill) = Fill::resolve(&self.caps, self.pattern.as_deref()) else {
            return;
        };
        let mut w = SpanWriter {
            layer: &self.layer,
            funcs: CompositeFuncs::get(self.layer.format, self.caps.op),
            fill,
            buffer: &mut self.buffer,
        };
        for (index, at) in placements {
            let Some(placed) = run.glyphs().get(index) else {
                continue;
            };
            let g = &placed.glyph;
            let gbox = IntBox::from_xywh(at.x, at.y, g.width() as i32, g.height() as i32);
            let Some(area) = gbox.intersect(bounds) else {
                continue;
            };
            let mut y = align_to_delta(area.y0, self.offset, self.delta);
            while y < area.y1 {
                let mask = g.row((y - at.y) as u32);
                for cb in self.clip.row_boxes(y) {
                    let x0 = area.x0.max(cb.x0);
                    let x1 = area.x1.min(cb.x1);
                    if x0 < x1 {
                        let cov = &mask[(x0 - at.x) as usize..(x1 - at.x) as usize];
                        w.span(y, x0, x1 - x0, SpanCoverage::Mask(cov));
                    }
                }
                y += self.delta;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
