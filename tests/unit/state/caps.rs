use super::*;

fn classify(t: Affine, origin: IntPoint) -> CapsState {
    let mut caps = CapsState {
        user_transform: t,
        ..CapsState::default()
    };
    caps.update_transform(origin);
    caps
}

#[test]
fn whole_pixel_translation_is_exact() {
    let caps = classify(Affine::translate((3.0, -2.0)), IntPoint::new(10, 10));
    assert_eq!(caps.transform_kind, TransformKind::ExactTranslate);
    assert_eq!(caps.translation, IntPoint::new(13, 8));
    assert_eq!(caps.approximation_scale, 1.0);
}

#[test]
fn sub_1_256_noise_still_counts_as_exact() {
    let caps = classify(Affine::translate((4.001, 0.0)), IntPoint::ZERO);
    assert_eq!(caps.transform_kind, TransformKind::ExactTranslate);
    assert_eq!(caps.translation, IntPoint::new(4, 0));
}

#[test]
fn fractional_translation_is_subpixel() {
    let caps = classify(Affine::translate((0.5, 0.0)), IntPoint::ZERO);
    assert_eq!(caps.transform_kind, TransformKind::SubpixelTranslate);
}

#[test]
fn scaling_is_affine_with_scale() {
    let caps = classify(Affine::scale(2.0), IntPoint::ZERO);
    assert_eq!(caps.transform_kind, TransformKind::Affine);
    assert!((caps.approximation_scale - 2.0).abs() < 1e-9);
}

#[test]
fn work_origin_is_applied_after_user_transform() {
    let caps = classify(Affine::scale(2.0), IntPoint::new(5, 0));
    assert_eq!(caps.transform * kurbo::Point::new(1.0, 1.0), kurbo::Point::new(7.0, 2.0));
}

#[test]
fn cloned_state_is_independent() {
    let a = Arc::new(CapsState::default());
    let mut b = Arc::clone(&a);
    Arc::make_mut(&mut b).op = Operator::Xor;
    assert_eq!(a.op, Operator::SrcOver);
    assert_eq!(b.op, Operator::Xor);
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn default_stroke_is_butt_capped_and_mitered() {
    let stroke = CapsState::default().stroke;
    assert_eq!(stroke.width, 1.0);
    assert_eq!(stroke.start_cap, Cap::Butt);
    assert_eq!(stroke.end_cap, Cap::Butt);
    assert_eq!(stroke.join, Join::Miter);
    assert_eq!(stroke.miter_limit, 4.0);
}

#[test]
fn solid_sources_carry_both_color_forms() {
    let Source::Solid(color) = Source::solid(Argb(0x80FF_0000)) else {
        panic!("expected a solid source");
    };
    assert_eq!(color.argb(), Argb(0x80FF_0000));
    assert_eq!(color.premultiplied(), 0x8080_0000);
    assert_eq!(SolidColor::from(Argb(0xFF12_3456)).premultiplied(), 0xFF12_3456);
}
