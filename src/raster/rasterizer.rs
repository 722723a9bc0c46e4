//! Anti-aliased cell rasterizer.
//!
//! Edges are accumulated into cells carrying a signed `cover` (vertical extent
//! crossed inside the pixel) and `area` (cover weighted by horizontal position),
//! both in 24.8 fixed point. Once finalized the cell list is sorted by row and
//! only read, so many workers can sweep disjoint rows of the same rasterizer.

use crate::foundation::core::{IntBox, Point};
use crate::raster::path::FlatPath;
use crate::raster::scanline::Scanline;

const SUBPIXEL_SHIFT: i64 = 8;
const SUBPIXEL_SCALE: i64 = 1 << SUBPIXEL_SHIFT;
const SUBPIXEL_MASK: i64 = SUBPIXEL_SCALE - 1;
// Doubled area of a full pixel scaled down to 8-bit coverage.
const AREA_SHIFT: u32 = 9;

/// Rule deciding which winding numbers count as inside.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum FillRule {
    /// Inside when the winding number is non-zero.
    #[default]
    NonZero,
    /// Inside when the winding number is odd.
    EvenOdd,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Cell {
    x: i32,
    y: i32,
    cover: i32,
    area: i32,
}

/// Scanline rasterizer for flattened paths.
#[derive(Clone, Debug)]
pub struct Rasterizer {
    clip: IntBox,
    fill_rule: FillRule,
    cells: Vec<Cell>,
    cur: Cell,
    // Row `y` owns `cells[row_starts[y - min_y]..row_starts[y - min_y + 1]]`.
    row_starts: Vec<usize>,
    min_x: i32,
    min_y: i32,
    max_y: i32,
    finalized: bool,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    /// Empty rasterizer with an empty clip box.
    pub fn new() -> Self {
        Self {
            clip: IntBox::default(),
            fill_rule: FillRule::NonZero,
            cells: Vec::new(),
            cur: Cell {
                x: i32::MAX,
                y: i32::MAX,
                ..Cell::default()
            },
            row_starts: Vec::new(),
            min_x: i32::MAX,
            min_y: i32::MAX,
            max_y: i32::MIN,
            finalized: false,
        }
    }

    /// Drop all cells, keeping allocations, clip box and fill rule.
    pub fn reset(&mut self) {
        self.cells.clear();
        self.row_starts.clear();
        self.cur = Cell {
            x: i32::MAX,
            y: i32::MAX,
            ..Cell::default()
        };
        self.min_x = i32::MAX;
        self.min_y = i32::MAX;
        self.max_y = i32::MIN;
        self.finalized = false;
    }

    /// Restrict output to `clip`. Must be called before adding paths.
    pub fn set_clip_box(&mut self, clip: IntBox) {
        self.clip = clip;
    }

    /// Select the fill rule used when sweeping.
    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.fill_rule = rule;
    }

    /// Current fill rule.
    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    /// Accumulate every contour of `path`, closing each one implicitly.
    pub fn add_path(&mut self, path: &FlatPath) {
        debug_assert!(!self.finalized, "add_path after finalize");
        if !self.clip.is_valid() {
            return;
        }
        for contour in path.contours() {
            if contour.len() < 2 {
                continue;
            }
            for w in contour.windows(2) {
                self.clip_line(w[0], w[1]);
            }
            if let (Some(&first), Some(&last)) = (contour.first(), contour.last()) {
                self.clip_line(last, first);
            }
        }
    }

    /// Sort cells and build the row index. Further sweeps are read-only.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.flush_cell();
        self.finalized = true;
        if self.cells.is_empty() {
            return;
        }
        self.cells.sort_unstable_by_key(|c| (c.y, c.x));

        let rows = (self.max_y - self.min_y + 1) as usize;
        self.row_starts.clear();
        self.row_starts.resize(rows + 1, 0);
        for c in &self.cells {
            self.row_starts[(c.y - self.min_y) as usize + 1] += 1;
        }
        for i in 1..self.row_starts.len() {
            self.row_starts[i] += self.row_starts[i - 1];
        }
    }

    /// Return `true` when the finalized rasterizer produced any cell.
    pub fn has_cells(&self) -> bool {
        self.finalized && !self.cells.is_empty()
    }

    /// Box enclosing every pixel a sweep can emit.
    pub fn bounds(&self) -> Option<IntBox> {
        if !self.has_cells() {
            return None;
        }
        IntBox::new(self.min_x, self.min_y, self.clip.x1, self.max_y + 1).intersect(self.clip)
    }

    /// Convert row `y` into spans. Returns `true` when any span was produced.
    pub fn sweep_scanline(&self, sl: &mut Scanline, y: i32) -> bool {
        sl.reset(y);
        let cells = self.row_cells(y);
        if cells.is_empty() {
            return false;
        }

        let mut cover = 0i32;
        let mut i = 0;
        while i < cells.len() {
            let mut x = cells[i].x;
            let mut area = 0;
            while i < cells.len() && cells[i].x == x {
                area += cells[i].area;
                cover += cells[i].cover;
                i += 1;
            }

            if area != 0 {
                sl.push_cell(x, self.alpha((cover << AREA_SHIFT) - area));
                x += 1;
            }

            let next = cells.get(i).map_or(self.clip.x1, |c| c.x.min(self.clip.x1));
            if next > x && cover != 0 {
                sl.push_solid(x, next - x, self.alpha(cover << AREA_SHIFT));
            }
        }
        !sl.is_empty()
    }

    /// Like [`Rasterizer::sweep_scanline`], keeping only pixels inside `clip`.
    ///
    /// `clip` are the sorted disjoint boxes of one region row; `tmp` is scratch.
    pub fn sweep_scanline_clipped(
        &self,
        sl: &mut Scanline,
        tmp: &mut Scanline,
        y: i32,
        clip: &[IntBox],
    ) -> bool {
        if !self.sweep_scanline(tmp, y) {
            sl.reset(y);
            return false;
        }
        tmp.clip_into(clip, sl);
        !sl.is_empty()
    }

    fn row_cells(&self, y: i32) -> &[Cell] {
        if !self.has_cells() || y < self.min_y || y > self.max_y {
            return &[];
        }
        let r = (y - self.min_y) as usize;
        &self.cells[self.row_starts[r]..self.row_starts[r + 1]]
    }

    fn alpha(&self, area: i32) -> u8 {
        let mut cover = (area >> AREA_SHIFT).abs();
        if self.fill_rule == FillRule::EvenOdd {
            cover &= 511;
            if cover > 256 {
                cover = 512 - cover;
            }
        }
        cover.min(255) as u8
    }

    // Clip a device-space segment against the clip box. Parts above or below
    // are dropped; parts left or right are projected onto the box edge so the
    // winding seen by the pixels inside stays intact.
    fn clip_line(&mut self, a: Point, b: Point) {
        if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
            return;
        }
        let cx0 = f64::from(self.clip.x0);
        let cx1 = f64::from(self.clip.x1);
        let cy0 = f64::from(self.clip.y0);
        let cy1 = f64::from(self.clip.y1);

        if a.y == b.y || (a.y <= cy0 && b.y <= cy0) || (a.y >= cy1 && b.y >= cy1) {
            return;
        }
        let at_y = |p: Point, q: Point, y: f64| {
            Point::new(p.x + (q.x - p.x) * (y - p.y) / (q.y - p.y), y)
        };
        let (mut a, mut b) = (a, b);
        if a.y < cy0 {
            a = at_y(a, b, cy0);
        } else if b.y < cy0 {
            b = at_y(a, b, cy0);
        }
        if a.y > cy1 {
            a = at_y(a, b, cy1);
        } else if b.y > cy1 {
            b = at_y(a, b, cy1);
        }

        // Split where the segment crosses the vertical clip edges.
        let mut ts = [0.0f64; 4];
        let mut n = 1;
        if a.x != b.x {
            for edge in [cx0, cx1] {
                let t = (edge - a.x) / (b.x - a.x);
                if t > 0.0 && t < 1.0 {
                    ts[n] = t;
                    n += 1;
                }
            }
        }
        ts[n] = 1.0;
        n += 1;
        ts[..n].sort_by(f64::total_cmp);

        let point_at = |t: f64| {
            let p = if t <= 0.0 {
                a
            } else if t >= 1.0 {
                b
            } else {
                a.lerp(b, t)
            };
            Point::new(p.x.clamp(cx0, cx1), p.y)
        };
        for w in ts[..n].windows(2) {
            let p = point_at(w[0]);
            let q = point_at(w[1]);
            self.line(
                to_subpixel(p.x),
                to_subpixel(p.y),
                to_subpixel(q.x),
                to_subpixel(q.y),
            );
        }
    }

    fn line(&mut self, x1: i64, y1: i64, x2: i64, y2: i64) {
        let dx = x2 - x1;
        let mut dy = y2 - y1;
        let ex1 = x1 >> SUBPIXEL_SHIFT;
        let mut ey1 = y1 >> SUBPIXEL_SHIFT;
        let ey2 = y2 >> SUBPIXEL_SHIFT;
        let fy1 = y1 & SUBPIXEL_MASK;
        let fy2 = y2 & SUBPIXEL_MASK;

        self.set_cell(ex1, ey1);
        if ey1 == ey2 {
            self.hline(ey1, x1, fy1, x2, fy2);
            return;
        }

        let mut incr = 1;
        if dx == 0 {
            let two_fx = (x1 - (ex1 << SUBPIXEL_SHIFT)) << 1;
            let mut first = SUBPIXEL_SCALE;
            if dy < 0 {
                first = 0;
                incr = -1;
            }
            let delta = first - fy1;
            self.add(delta, two_fx * delta);
            ey1 += incr;
            self.set_cell(ex1, ey1);

            let delta = first + first - SUBPIXEL_SCALE;
            while ey1 != ey2 {
                self.add(delta, two_fx * delta);
                ey1 += incr;
                self.set_cell(ex1, ey1);
            }
            let delta = fy2 - SUBPIXEL_SCALE + first;
            self.add(delta, two_fx * delta);
            return;
        }

        let mut p = (SUBPIXEL_SCALE - fy1) * dx;
        let mut first = SUBPIXEL_SCALE;
        if dy < 0 {
            p = fy1 * dx;
            first = 0;
            incr = -1;
            dy = -dy;
        }
        let (mut delta, mut rem_acc) = floor_divmod(p, dy);
        let mut x_from = x1 + delta;
        self.hline(ey1, x1, fy1, x_from, first);
        ey1 += incr;
        self.set_cell(x_from >> SUBPIXEL_SHIFT, ey1);

        if ey1 != ey2 {
            let (lift, rem) = floor_divmod(SUBPIXEL_SCALE * dx, dy);
            rem_acc -= dy;
            while ey1 != ey2 {
                delta = lift;
                rem_acc += rem;
                if rem_acc >= 0 {
                    rem_acc -= dy;
                    delta += 1;
                }
                let x_to = x_from + delta;
                self.hline(ey1, x_from, SUBPIXEL_SCALE - first, x_to, first);
                x_from = x_to;
                ey1 += incr;
                self.set_cell(x_from >> SUBPIXEL_SHIFT, ey1);
            }
        }
        self.hline(ey1, x_from, SUBPIXEL_SCALE - first, x2, fy2);
    }

    fn hline(&mut self, ey: i64, x1: i64, y1: i64, x2: i64, y2: i64) {
        let mut ex1 = x1 >> SUBPIXEL_SHIFT;
        let ex2 = x2 >> SUBPIXEL_SHIFT;
        let fx1 = x1 & SUBPIXEL_MASK;
        let fx2 = x2 & SUBPIXEL_MASK;

        if y1 == y2 {
            self.set_cell(ex2, ey);
            return;
        }
        if ex1 == ex2 {
            let delta = y2 - y1;
            self.add(delta, (fx1 + fx2) * delta);
            return;
        }

        let mut p = (SUBPIXEL_SCALE - fx1) * (y2 - y1);
        let mut first = SUBPIXEL_SCALE;
        let mut incr = 1;
        let mut dx = x2 - x1;
        if dx < 0 {
            p = fx1 * (y2 - y1);
            first = 0;
            incr = -1;
            dx = -dx;
        }
        let (mut delta, mut rem_acc) = floor_divmod(p, dx);
        self.add(delta, (fx1 + first) * delta);
        ex1 += incr;
        self.set_cell(ex1, ey);
        let mut y = y1 + delta;

        if ex1 != ex2 {
            let (lift, rem) = floor_divmod(SUBPIXEL_SCALE * (y2 - y + delta), dx);
            rem_acc -= dx;
            while ex1 != ex2 {
                delta = lift;
                rem_acc += rem;
                if rem_acc >= 0 {
                    rem_acc -= dx;
                    delta += 1;
                }
                self.add(delta, SUBPIXEL_SCALE * delta);
                y += delta;
                ex1 += incr;
                self.set_cell(ex1, ey);
            }
        }
        let delta = y2 - y;
        self.add(delta, (fx2 + SUBPIXEL_SCALE - first) * delta);
    }

    #[inline]
    fn add(&mut self, cover: i64, area: i64) {
        self.cur.cover += cover as i32;
        self.cur.area += area as i32;
    }

    fn set_cell(&mut self, x: i64, y: i64) {
        let (x, y) = (x as i32, y as i32);
        if self.cur.x != x || self.cur.y != y {
            self.flush_cell();
            self.cur = Cell {
                x,
                y,
                cover: 0,
                area: 0,
            };
        }
    }

    fn flush_cell(&mut self) {
        let c = self.cur;
        if (c.cover | c.area) == 0
            || c.y < self.clip.y0
            || c.y >= self.clip.y1
            || c.x >= self.clip.x1
        {
            return;
        }
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_y = self.max_y.max(c.y);
        self.cells.push(c);
    }
}

fn to_subpixel(v: f64) -> i64 {
    (v * SUBPIXEL_SCALE as f64).round() as i64
}

fn floor_divmod(p: i64, d: i64) -> (i64, i64) {
    let (mut q, mut r) = (p / d, p % d);
    if r < 0 {
        q -= 1;
        r += d;
    }
    (q, r)
}

#[cfg(test)]
#[path = "../../tests/unit/raster/rasterizer.rs"]
mod tests;
