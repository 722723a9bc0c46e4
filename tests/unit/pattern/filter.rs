use super::*;

#[test]
fn identity_keeps_pixels() {
    let f = ColorFilter::identity();
    assert_eq!(f.apply(0xFF12_3456), 0xFF12_3456);
    assert_eq!(f.apply(0), 0);
}

#[test]
fn invert_flips_color_keeps_alpha() {
    let f = ColorFilter::invert();
    assert_eq!(f.apply(0xFFFF_0000), 0xFF00_FFFF);
}

#[test]
fn grayscale_equalizes_channels() {
    let out = ColorFilter::grayscale().apply(0xFF20_80C0);
    assert_eq!(channel(out, 16), channel(out, 8));
    assert_eq!(channel(out, 8), channel(out, 0));
}

#[test]
fn non_finite_matrix_is_rejected() {
    let mut m = *ColorFilter::identity().matrix();
    m[0][0] = f32::NAN;
    assert!(ColorFilter::new(m).is_err());
}
