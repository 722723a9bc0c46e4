//! Per-pixel fetchers for [`Pattern`] sources.
//!
//! A context is built once per (pattern, transform) pair and is then shared
//! read-only by every worker that renders a command using it.

use std::f64::consts::TAU;

use crate::foundation::core::{Affine, Point, Vec2};
use crate::foundation::error::{PaintError, PaintResult};
use crate::foundation::math::{channel, div255, pack};
use crate::pattern::{GradientStop, Interpolation, Pattern, PatternKind, Spread};
use crate::surface::image::Image;

const LUT_SIZE: usize = 256;

#[derive(Debug)]
enum Fetcher {
    Texture {
        image: Image,
        interpolation: Interpolation,
        // Set when device pixels map onto whole texels by a pure translation.
        offset: Option<(i64, i64)>,
    },
    Linear {
        lut: Box<[u32; LUT_SIZE]>,
        start: Point,
        // Direction scaled by `1 / |end - start|^2`.
        dir: Vec2,
    },
    Radial {
        lut: Box<[u32; LUT_SIZE]>,
        center: Point,
        radius: f64,
    },
    Conical {
        lut: Box<[u32; LUT_SIZE]>,
        center: Point,
        angle: f64,
    },
}

/// Compiled pattern ready to produce premultiplied spans in device space.
#[derive(Debug)]
pub(crate) struct PatternContext {
    fetcher: Fetcher,
    // Device space to pattern space.
    inverse: Affine,
    spread: Spread,
}

impl PatternContext {
    /// Compile `pattern` as seen through the user-to-device `transform`.
    pub(crate) fn build(
        pattern: &Pattern,
        transform: Affine,
        interpolation: Interpolation,
    ) -> PaintResult<Self> {
        let full = transform * pattern.transform();
        let det = full.determinant();
        if !det.is_finite() || det.abs() < f64::EPSILON {
            return Err(PaintError::pattern("pattern transform is not invertible"));
        }
        let inverse = full.inverse();

        let fetcher = match pattern.kind() {
            PatternKind::Texture(image) => {
                let c = inverse.as_coeffs();
                let aligned = |v: f64| (v - v.round()).abs() < 1e-6;
                let offset = (c[0] == 1.0
                    && c[1] == 0.0
                    && c[2] == 0.0
                    && c[3] == 1.0
                    && aligned(c[4])
                    && aligned(c[5]))
                .then(|| (c[4].round() as i64, c[5].round() as i64));
                Fetcher::Texture {
                    image: image.clone(),
                    interpolation,
                    offset,
                }
            }
            PatternKind::Linear { start, end } => {
                let d = *end - *start;
                let len2 = d.hypot2();
                if !len2.is_finite() || len2 < 1e-12 {
                    return Err(PaintError::pattern("linear gradient has zero length"));
                }
                Fetcher::Linear {
                    lut: build_lut(pattern.stops())?,
                    start: *start,
                    dir: d / len2,
                }
            }
            PatternKind::Radial { center, radius } => {
                if !radius.is_finite() || *radius <= 0.0 {
                    return Err(PaintError::pattern(format!(
                        "radial gradient radius must be positive, got {radius}"
                    )));
                }
                Fetcher::Radial {
                    lut: build_lut(pattern.stops())?,
                    center: *center,
                    radius: *radius,
                }
            }
            PatternKind::Conical { center, angle } => {
                if !angle.is_finite() {
                    return Err(PaintError::pattern("conical gradient angle must be finite"));
                }
                Fetcher::Conical {
                    lut: build_lut(pattern.stops())?,
                    center: *center,
                    angle: *angle,
                }
            }
        };

        Ok(Self {
            fetcher,
            inverse,
            spread: pattern.spread(),
        })
    }

    /// Fill `out` with the premultiplied colors of the pixels starting at `(x, y)`.
    pub(crate) fn fetch(&self, out: &mut [u32], x: i32, y: i32) {
        match &self.fetcher {
            Fetcher::Texture {
                image,
                interpolation,
                offset,
            } => {
                if let Some((ox, oy)) = offset {
                    let ty = i64::from(y) + oy;
                    for (i, px) in out.iter_mut().enumerate() {
                        *px = texel(image, self.spread, i64::from(x) + i as i64 + ox, ty);
                    }
                    return;
                }
                for (i, px) in out.iter_mut().enumerate() {
                    let p = self.map(x + i as i32, y);
                    *px = match interpolation {
                        Interpolation::Nearest => texel(
                            image,
                            self.spread,
                            p.x.floor() as i64,
                            p.y.floor() as i64,
                        ),
                        Interpolation::Smooth => bilinear(image, self.spread, p),
                    };
                }
            }
            Fetcher::Linear { lut, start, dir } => {
                for (i, px) in out.iter_mut().enumerate() {
                    let t = (self.map(x + i as i32, y) - *start).dot(*dir);
                    *px = lut_lookup(lut, self.spread, t);
                }
            }
            Fetcher::Radial {
                lut,
                center,
                radius,
            } => {
                for (i, px) in out.iter_mut().enumerate() {
                    let t = (self.map(x + i as i32, y) - *center).hypot() / radius;
                    *px = lut_lookup(lut, self.spread, t);
                }
            }
            Fetcher::Conical { lut, center, angle } => {
                for (i, px) in out.iter_mut().enumerate() {
                    let d = self.map(x + i as i32, y) - *center;
                    let t = ((d.y.atan2(d.x) - angle) / TAU).rem_euclid(1.0);
                    *px = lut_lookup(lut, Spread::Pad, t);
                }
            }
        }
    }

    fn map(&self, x: i32, y: i32) -> Point {
        self.inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5)
    }
}

fn wrap(i: i64, n: i64, spread: Spread) -> i64 {
    match spread {
        Spread::Pad => i.clamp(0, n - 1),
        Spread::Repeat => i.rem_euclid(n),
        Spread::Reflect => {
            let m = i.rem_euclid(2 * n);
            if m >= n { 2 * n - 1 - m } else { m }
        }
    }
}

fn wrap_t(t: f64, spread: Spread) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    match spread {
        Spread::Pad => t.clamp(0.0, 1.0),
        Spread::Repeat => t - t.floor(),
        Spread::Reflect => {
            let m = t.rem_euclid(2.0);
            if m > 1.0 { 2.0 - m } else { m }
        }
    }
}

fn texel(image: &Image, spread: Spread, x: i64, y: i64) -> u32 {
    let w = i64::from(image.width());
    let h = i64::from(image.height());
    let tx = wrap(x, w, spread) as u32;
    let ty = wrap(y, h, spread) as u32;
    image
        .pixel(tx, ty)
        .map_or(0, |raw| image.format().load(raw))
}

fn bilinear(image: &Image, spread: Spread, p: Point) -> u32 {
    let fx = p.x - 0.5;
    let fy = p.y - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let wx = ((fx - x0) * 256.0).round() as u32;
    let wy = ((fy - y0) * 256.0).round() as u32;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = texel(image, spread, x0, y0);
    let p10 = texel(image, spread, x0 + 1, y0);
    let p01 = texel(image, spread, x0, y0 + 1);
    let p11 = texel(image, spread, x0 + 1, y0 + 1);

    let mix = |shift: u32| {
        let top = channel(p00, shift) * (256 - wx) + channel(p10, shift) * wx;
        let bot = channel(p01, shift) * (256 - wx) + channel(p11, shift) * wx;
        (top * (256 - wy) + bot * wy + (1 << 15)) >> 16
    };
    pack(mix(24), mix(16), mix(8), mix(0))
}

fn lut_lookup(lut: &[u32; LUT_SIZE], spread: Spread, t: f64) -> u32 {
    let i = (wrap_t(t, spread) * (LUT_SIZE - 1) as f64).round() as usize;
    lut[i.min(LUT_SIZE - 1)]
}

/// Premultiplied color table sampled uniformly over `0..=1`.
fn build_lut(stops: &[GradientStop]) -> PaintResult<Box<[u32; LUT_SIZE]>> {
    if stops.is_empty() {
        return Err(PaintError::pattern("gradient has no stops"));
    }
    if stops.iter().any(|s| !s.offset.is_finite()) {
        return Err(PaintError::pattern("gradient stop offset must be finite"));
    }
    let mut sorted: Vec<(f64, u32)> = stops
        .iter()
        .map(|s| (s.offset.clamp(0.0, 1.0), s.color.premultiplied()))
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut lut = Box::new([0u32; LUT_SIZE]);
    let mut seg = 0;
    for (i, slot) in lut.iter_mut().enumerate() {
        let t = i as f64 / (LUT_SIZE - 1) as f64;
        while seg + 1 < sorted.len() && sorted[seg + 1].0 < t {
            seg += 1;
        }
        let (t0, c0) = sorted[seg];
        *slot = match sorted.get(seg + 1) {
            _ if t <= t0 => c0,
            None => c0,
            Some(&(t1, c1)) => {
                let w = if t1 > t0 { (t - t0) / (t1 - t0) } else { 1.0 };
                let w = (w.clamp(0.0, 1.0) * 255.0).round() as u32;
                let mix = |shift: u32| {
                    div255(channel(c0, shift) * (255 - w) + channel(c1, shift) * w)
                };
                pack(mix(24), mix(16), mix(8), mix(0))
            }
        };
    }
    Ok(lut)
}

#[cfg(test)]
#[path = "../../tests/unit/pattern/context.rs"]
mod tests;
