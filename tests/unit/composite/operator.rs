use super::*;

const RED: u32 = 0xFFFF_0000;
const HALF_BLUE: u32 = 0x8000_0080;

#[test]
fn src_over_opaque_replaces_and_transparent_keeps() {
    assert_eq!(Operator::SrcOver.blend(HALF_BLUE, RED), RED);
    assert_eq!(Operator::SrcOver.blend(HALF_BLUE, 0), HALF_BLUE);
}

#[test]
fn src_over_translucent_on_opaque_stays_opaque() {
    let out = Operator::SrcOver.blend(RED, HALF_BLUE);
    assert_eq!(out >> 24, 0xFF);
    assert_eq!(out & 0xFF, 0x80);
}

#[test]
fn porter_duff_identities() {
    assert_eq!(Operator::Clear.blend(RED, HALF_BLUE), 0);
    assert_eq!(Operator::Src.blend(RED, HALF_BLUE), HALF_BLUE);
    assert_eq!(Operator::Dst.blend(RED, HALF_BLUE), RED);
    assert_eq!(Operator::SrcIn.blend(0, RED), 0);
    assert_eq!(Operator::DstOut.blend(RED, 0xFF00_0000), 0);
    assert_eq!(Operator::Xor.blend(RED, 0xFF00_FF00), 0);
    assert_eq!(Operator::DstOver.blend(0, RED), RED);
}

#[test]
fn add_saturates() {
    assert_eq!(Operator::Add.blend(0xFF80_8080, 0xFF80_8080), 0xFFFF_FFFF);
}

#[test]
fn separable_modes_on_opaque_colors() {
    let a = 0xFF40_8000;
    let b = 0xFF80_4000;
    assert_eq!(Operator::Darken.blend(a, b), 0xFF40_4000);
    assert_eq!(Operator::Lighten.blend(a, b), 0xFF80_8000);
    assert_eq!(Operator::Difference.blend(a, b), 0xFF40_4000);
    assert_eq!(Operator::Multiply.blend(0xFFFF_FFFF, b), b);
    assert_eq!(Operator::Screen.blend(0xFF00_0000, b), b);
}

#[test]
fn index_lookup_matches_declaration_order() {
    assert_eq!(Operator::from_index(1), Some(Operator::SrcOver));
    assert_eq!(Operator::from_index(Operator::ALL.len()), None);
    assert_eq!(Operator::default(), Operator::SrcOver);
}
