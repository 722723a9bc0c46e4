/// `x / 255` rounded to nearest, exact for `x <= 255 * 255`.
#[inline]
pub(crate) fn div255(x: u32) -> u32 {
    (x + 128 + ((x + 128) >> 8)) >> 8
}

#[inline]
pub(crate) fn mul_div255(x: u32, y: u32) -> u32 {
    div255(x * y)
}

#[inline]
pub(crate) fn channel(px: u32, shift: u32) -> u32 {
    (px >> shift) & 0xFF
}

#[inline]
pub(crate) fn pack(a: u32, r: u32, g: u32, b: u32) -> u32 {
    (a.min(255) << 24) | (r.min(255) << 16) | (g.min(255) << 8) | b.min(255)
}

/// Convert straight `0xAARRGGBB` into premultiplied form.
pub(crate) fn premultiply(argb: u32) -> u32 {
    let a = argb >> 24;
    match a {
        0xFF => argb,
        0 => 0,
        _ => pack(
            a,
            mul_div255(channel(argb, 16), a),
            mul_div255(channel(argb, 8), a),
            mul_div255(channel(argb, 0), a),
        ),
    }
}

/// Convert premultiplied `0xAARRGGBB` back into straight form.
pub(crate) fn demultiply(prgb: u32) -> u32 {
    let a = prgb >> 24;
    match a {
        0xFF => prgb,
        0 => 0,
        _ => {
            let un = |c: u32| ((c * 255 + a / 2) / a).min(255);
            pack(
                a,
                un(channel(prgb, 16)),
                un(channel(prgb, 8)),
                un(channel(prgb, 0)),
            )
        }
    }
}

/// Per-channel `dst + (src - dst) * cov / 255`.
#[inline]
pub(crate) fn lerp_pixel(dst: u32, src: u32, cov: u32) -> u32 {
    match cov {
        0 => dst,
        0xFF => src,
        _ => {
            let inv = 255 - cov;
            let mix = |shift: u32| div255(channel(src, shift) * cov + channel(dst, shift) * inv);
            pack(mix(24), mix(16), mix(8), mix(0))
        }
    }
}

/// First row `>= y` that belongs to the partition `offset` of `delta`.
pub(crate) fn align_to_delta(y: i32, offset: i32, delta: i32) -> i32 {
    debug_assert!(delta > 0 && (0..delta).contains(&offset));
    let mody = y.rem_euclid(delta);
    let mut aligned = y - mody + offset;
    if aligned < y {
        aligned += delta;
    }
    aligned
}

pub(crate) fn fuzzy_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
