//! Banded rectangle sets used for clipping.
//!
//! A normalized region stores disjoint boxes grouped in horizontal bands.
//! Bands are sorted top to bottom and never overlap; boxes inside a band share
//! the band's `y0`/`y1`, are sorted left to right and never touch. Vertically
//! adjacent bands with identical spans are coalesced.

use smallvec::SmallVec;

use crate::foundation::core::IntBox;

type Spans = SmallVec<[(i32, i32); 8]>;

/// Normalized set of disjoint integer boxes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Region {
    boxes: SmallVec<[IntBox; 4]>,
}

impl Region {
    /// Empty region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Region made of a single box (empty if the box is degenerate).
    pub fn from_box(b: IntBox) -> Self {
        let mut boxes = SmallVec::new();
        if b.is_valid() {
            boxes.push(b);
        }
        Self { boxes }
    }

    /// Union of arbitrary, possibly overlapping boxes.
    pub fn from_boxes(boxes: &[IntBox]) -> Self {
        let valid: SmallVec<[IntBox; 8]> = boxes.iter().copied().filter(|b| b.is_valid()).collect();
        if valid.len() <= 1 {
            return Self {
                boxes: valid.into_iter().collect(),
            };
        }

        let mut builder = BandBuilder::default();
        for (ya, yb) in slabs(valid.iter().flat_map(|b| [b.y0, b.y1])) {
            let mut spans: Spans = valid
                .iter()
                .filter(|b| b.y0 <= ya && b.y1 >= yb)
                .map(|b| (b.x0, b.x1))
                .collect();
            spans.sort_unstable();
            merge_touching(&mut spans);
            builder.push_band(ya, yb, &spans);
        }
        builder.finish()
    }

    /// Boxes in band order.
    pub fn boxes(&self) -> &[IntBox] {
        &self.boxes
    }

    /// Number of boxes.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Return `true` when the region covers no pixel.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Return `true` when the region is empty or a single rectangle.
    pub fn is_rect(&self) -> bool {
        self.boxes.len() <= 1
    }

    /// Bounding box of the region.
    pub fn extents(&self) -> Option<IntBox> {
        let first = self.boxes.first()?;
        let last = self.boxes.last()?;
        let (x0, x1) = self
            .boxes
            .iter()
            .fold((i32::MAX, i32::MIN), |(lo, hi), b| (lo.min(b.x0), hi.max(b.x1)));
        Some(IntBox::new(x0, first.y0, x1, last.y1))
    }

    /// Region shifted by `(dx, dy)`.
    pub fn translate(&self, dx: i32, dy: i32) -> Region {
        if dx == 0 && dy == 0 {
            return self.clone();
        }
        Region {
            boxes: self.boxes.iter().map(|b| b.translate(dx, dy)).collect(),
        }
    }

    /// Pixels covered by both regions.
    pub fn intersect(&self, other: &Region) -> Region {
        if self.is_empty() || other.is_empty() {
            return Region::new();
        }
        if self.is_rect() && other.is_rect() {
            return Region::from_box(self.boxes[0].intersect(other.boxes[0]).unwrap_or_default());
        }

        let edges = self
            .boxes
            .iter()
            .chain(other.boxes.iter())
            .flat_map(|b| [b.y0, b.y1]);
        let mut builder = BandBuilder::default();
        for (ya, yb) in slabs(edges) {
            let a = self.row_boxes(ya);
            let b = other.row_boxes(ya);
            if a.is_empty() || b.is_empty() {
                continue;
            }
            builder.push_band(ya, yb, &intersect_spans(a, b));
        }
        builder.finish()
    }

    /// Pixels covered by both the region and `b`.
    pub fn intersect_box(&self, b: IntBox) -> Region {
        self.intersect(&Region::from_box(b))
    }

    /// Return `true` when pixel `(x, y)` is inside the region.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.row_boxes(y).iter().any(|b| b.x0 <= x && x < b.x1)
    }

    /// Boxes of the band that contains row `y` (empty if none).
    pub(crate) fn row_boxes(&self, y: i32) -> &[IntBox] {
        let start = self.boxes.partition_point(|b| b.y1 <= y);
        let Some(first) = self.boxes.get(start) else {
            return &[];
        };
        if first.y0 > y {
            return &[];
        }
        let len = self.boxes[start..]
            .iter()
            .take_while(|b| b.y0 == first.y0)
            .count();
        &self.boxes[start..start + len]
    }
}

impl From<IntBox> for Region {
    fn from(b: IntBox) -> Self {
        Region::from_box(b)
    }
}

/// Consecutive `[ya, yb)` pairs between the sorted unique edges.
fn slabs(edges: impl Iterator<Item = i32>) -> impl Iterator<Item = (i32, i32)> {
    let mut ys: SmallVec<[i32; 16]> = edges.collect();
    ys.sort_unstable();
    ys.dedup();
    let pairs: SmallVec<[(i32, i32); 16]> = ys.windows(2).map(|w| (w[0], w[1])).collect();
    pairs.into_iter()
}

fn merge_touching(spans: &mut Spans) {
    let mut out = Spans::new();
    for &(x0, x1) in spans.iter() {
        match out.last_mut() {
            Some(last) if x0 <= last.1 => last.1 = last.1.max(x1),
            _ => out.push((x0, x1)),
        }
    }
    *spans = out;
}

fn intersect_spans(a: &[IntBox], b: &[IntBox]) -> Spans {
    let mut out = Spans::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let x0 = a[i].x0.max(b[j].x0);
        let x1 = a[i].x1.min(b[j].x1);
        if x0 < x1 {
            out.push((x0, x1));
        }
        if a[i].x1 < b[j].x1 {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

#[derive(Default)]
struct BandBuilder {
    boxes: SmallVec<[IntBox; 4]>,
    last_band: usize,
}

impl BandBuilder {
    fn push_band(&mut self, y0: i32, y1: i32, spans: &[(i32, i32)]) {
        if spans.is_empty() {
            return;
        }
        let prev = &mut self.boxes[self.last_band..];
        let same = !prev.is_empty()
            && prev[0].y1 == y0
            && prev.len() == spans.len()
            && prev
                .iter()
                .zip(spans)
                .all(|(b, &(x0, x1))| b.x0 == x0 && b.x1 == x1);
        if same {
            for b in prev.iter_mut() {
                b.y1 = y1;
            }
            return;
        }
        self.last_band = self.boxes.len();
        self.boxes
            .extend(spans.iter().map(|&(x0, x1)| IntBox::new(x0, y0, x1, y1)));
    }

    fn finish(self) -> Region {
        Region { boxes: self.boxes }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/region.rs"]
mod tests;
