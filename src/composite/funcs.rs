use std::sync::atomic::{AtomicU32, Ordering};

use crate::composite::operator::Operator;
use crate::foundation::math::lerp_pixel;
use crate::pattern::filter::ColorFilter;
use crate::raster::scanline::SpanCoverage;
use crate::surface::format::PixelFormat;

/// Span blending functions for one (pixel format, operator) pair.
///
/// `load`/`store` convert between the stored cells and premultiplied colors,
/// `blend` is the operator. Coverage is applied as `lerp(dst, blend(dst, src), cov)`.
#[derive(Clone, Copy)]
pub(crate) struct CompositeFuncs {
    op: Operator,
    load: fn(u32) -> u32,
    store: fn(u32) -> u32,
    blend: fn(u32, u32) -> u32,
}

impl CompositeFuncs {
    pub(crate) fn get(format: PixelFormat, op: Operator) -> Self {
        let (load, store): (fn(u32) -> u32, fn(u32) -> u32) = match format {
            PixelFormat::Prgb32 => (|p| p, |p| p),
            PixelFormat::Argb32 => (
                |p| PixelFormat::Argb32.load(p),
                |p| PixelFormat::Argb32.store(p),
            ),
            PixelFormat::Xrgb32 => (
                |p| PixelFormat::Xrgb32.load(p),
                |p| PixelFormat::Xrgb32.store(p),
            ),
            PixelFormat::A8 => (|p| PixelFormat::A8.load(p), |p| PixelFormat::A8.store(p)),
        };
        Self {
            op,
            load,
            store,
            blend: op.blend_fn(),
        }
    }

    /// Blend a solid premultiplied color into `dst`.
    pub(crate) fn cspan(&self, dst: &[AtomicU32], src: u32, cov: SpanCoverage<'_>) {
        if self.op == Operator::Dst {
            return;
        }
        match cov {
            SpanCoverage::Solid(0xFF) => {
                let replace = self.op == Operator::Src
                    || (self.op == Operator::SrcOver && src >> 24 == 0xFF);
                if replace {
                    let v = (self.store)(src);
                    for px in dst {
                        px.store(v, Ordering::Relaxed);
                    }
                } else {
                    for px in dst {
                        self.apply(px, src, 0xFF);
                    }
                }
            }
            SpanCoverage::Solid(c) => {
                for px in dst {
                    self.apply(px, src, u32::from(c));
                }
            }
            SpanCoverage::Mask(m) => {
                for (px, &c) in dst.iter().zip(m) {
                    self.apply(px, src, u32::from(c));
                }
            }
        }
    }

    /// Blend a row of premultiplied colors into `dst`.
    pub(crate) fn vspan(&self, dst: &[AtomicU32], src: &[u32], cov: SpanCoverage<'_>) {
        if self.op == Operator::Dst {
            return;
        }
        match cov {
            SpanCoverage::Solid(c) => {
                for (px, &s) in dst.iter().zip(src) {
                    self.apply(px, s, u32::from(c));
                }
            }
            SpanCoverage::Mask(m) => {
                for ((px, &s), &c) in dst.iter().zip(src).zip(m) {
                    self.apply(px, s, u32::from(c));
                }
            }
        }
    }

    /// Run `filter` over `dst` in place. The operator does not apply.
    pub(crate) fn filter_span(
        &self,
        dst: &[AtomicU32],
        filter: &ColorFilter,
        cov: SpanCoverage<'_>,
    ) {
        let run = |px: &AtomicU32, c: u32| {
            if c == 0 {
                return;
            }
            let d = (self.load)(px.load(Ordering::Relaxed));
            let out = lerp_pixel(d, filter.apply(d), c);
            px.store((self.store)(out), Ordering::Relaxed);
        };
        match cov {
            SpanCoverage::Solid(c) => dst.iter().for_each(|px| run(px, u32::from(c))),
            SpanCoverage::Mask(m) => dst
                .iter()
                .zip(m)
                .for_each(|(px, &c)| run(px, u32::from(c))),
        }
    }

    #[inline]
    fn apply(&self, px: &AtomicU32, src: u32, cov: u32) {
        if cov == 0 {
            return;
        }
        let d = (self.load)(px.load(Ordering::Relaxed));
        let out = lerp_pixel(d, (self.blend)(d, src), cov);
        px.store((self.store)(out), Ordering::Relaxed);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/funcs.rs"]
mod tests;
