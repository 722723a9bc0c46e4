use crate::foundation::core::IntBox;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cover {
    Solid(u8),
    Mask(usize),
}

#[derive(Clone, Copy, Debug)]
struct RawSpan {
    x: i32,
    len: i32,
    cover: Cover,
}

/// Coverage of a single [`Span`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanCoverage<'a> {
    /// Same coverage for every pixel of the span.
    Solid(u8),
    /// One coverage value per pixel.
    Mask(&'a [u8]),
}

/// Run of pixels on one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span<'a> {
    /// First pixel.
    pub x: i32,
    /// Number of pixels.
    pub len: i32,
    /// Coverage of those pixels.
    pub coverage: SpanCoverage<'a>,
}

/// Span accumulator for one row.
///
/// Spans are pushed left to right and never overlap. Zero coverage is never
/// stored.
#[derive(Clone, Debug, Default)]
pub struct Scanline {
    y: i32,
    spans: Vec<RawSpan>,
    covers: Vec<u8>,
}

impl Scanline {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all spans and retarget to row `y`.
    pub fn reset(&mut self, y: i32) {
        self.y = y;
        self.spans.clear();
        self.covers.clear();
    }

    /// Row the spans belong to.
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Return `true` when no span was pushed.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Number of spans.
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// Append a run with uniform coverage.
    pub fn push_solid(&mut self, x: i32, len: i32, cov: u8) {
        if len <= 0 || cov == 0 {
            return;
        }
        if let Some(last) = self.spans.last_mut()
            && last.cover == Cover::Solid(cov)
            && last.x + last.len == x
        {
            last.len += len;
            return;
        }
        self.spans.push(RawSpan {
            x,
            len,
            cover: Cover::Solid(cov),
        });
    }

    /// Append one pixel with its own coverage.
    pub fn push_cell(&mut self, x: i32, cov: u8) {
        if cov == 0 {
            return;
        }
        if let Some(last) = self.spans.last_mut()
            && matches!(last.cover, Cover::Mask(_))
            && last.x + last.len == x
        {
            last.len += 1;
            self.covers.push(cov);
            return;
        }
        self.spans.push(RawSpan {
            x,
            len: 1,
            cover: Cover::Mask(self.covers.len()),
        });
        self.covers.push(cov);
    }

    /// Append a run with per-pixel coverage.
    pub fn push_mask(&mut self, x: i32, covers: &[u8]) {
        if covers.is_empty() {
            return;
        }
        if let Some(last) = self.spans.last_mut()
            && matches!(last.cover, Cover::Mask(_))
            && last.x + last.len == x
        {
            last.len += covers.len() as i32;
        } else {
            self.spans.push(RawSpan {
                x,
                len: covers.len() as i32,
                cover: Cover::Mask(self.covers.len()),
            });
        }
        self.covers.extend_from_slice(covers);
    }

    /// Spans in left-to-right order.
    pub fn spans(&self) -> impl Iterator<Item = Span<'_>> + '_ {
        self.spans.iter().map(move |s| Span {
            x: s.x,
            len: s.len,
            coverage: match s.cover {
                Cover::Solid(c) => SpanCoverage::Solid(c),
                Cover::Mask(start) => SpanCoverage::Mask(&self.covers[start..start + s.len as usize]),
            },
        })
    }

    /// Write the parts of these spans that fall inside `boxes` into `out`.
    ///
    /// `boxes` must be sorted and disjoint, as returned for a region row.
    pub(crate) fn clip_into(&self, boxes: &[IntBox], out: &mut Scanline) {
        out.reset(self.y);
        for s in self.spans.iter() {
            let end = s.x + s.len;
            for b in boxes {
                let x0 = s.x.max(b.x0);
                let x1 = end.min(b.x1);
                if x0 >= x1 {
                    continue;
                }
                match s.cover {
                    Cover::Solid(c) => out.push_solid(x0, x1 - x0, c),
                    Cover::Mask(start) => {
                        let from = start + (x0 - s.x) as usize;
                        let to = start + (x1 - s.x) as usize;
                        out.push_mask(x0, &self.covers[from..to]);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/scanline.rs"]
mod tests;
