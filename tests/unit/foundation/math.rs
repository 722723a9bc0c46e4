use super::*;

#[test]
fn div255_matches_rounded_division() {
    for x in (0u32..=255 * 255).step_by(7) {
        let expected = ((f64::from(x)) / 255.0).round() as u32;
        assert_eq!(div255(x), expected, "x={x}");
    }
}

#[test]
fn premultiply_roundtrips_opaque_and_clears_transparent() {
    assert_eq!(premultiply(0xFF12_3456), 0xFF12_3456);
    assert_eq!(premultiply(0x00FF_FFFF), 0);
    assert_eq!(premultiply(0x80FF_0000), 0x8080_0000);
    assert_eq!(demultiply(0x8080_0000), 0x80FF_0000);
    assert_eq!(demultiply(0), 0);
}

#[test]
fn lerp_pixel_endpoints() {
    let d = 0x1020_3040;
    let s = 0xF0E0_D0C0;
    assert_eq!(lerp_pixel(d, s, 0), d);
    assert_eq!(lerp_pixel(d, s, 255), s);
    let mid = lerp_pixel(0, 0xFFFF_FFFF, 128);
    assert_eq!(channel(mid, 24), 128);
}

#[test]
fn align_to_delta_picks_first_owned_row() {
    assert_eq!(align_to_delta(0, 0, 4), 0);
    assert_eq!(align_to_delta(0, 3, 4), 3);
    assert_eq!(align_to_delta(5, 1, 4), 5);
    assert_eq!(align_to_delta(6, 1, 4), 9);
    assert_eq!(align_to_delta(-3, 2, 4), -2);
    assert_eq!(align_to_delta(10, 0, 1), 10);
}

#[test]
fn row_partitions_are_disjoint_and_cover_everything() {
    for delta in 1..=8 {
        let mut owners = vec![0u32; 64];
        for offset in 0..delta {
            let mut y = align_to_delta(0, offset, delta);
            while y < 64 {
                owners[y as usize] += 1;
                y += delta;
            }
        }
        assert!(owners.iter().all(|&n| n == 1), "delta={delta}");
    }
}
