use super::*;

fn dot(bearing: IntPoint) -> GlyphBitmap {
    GlyphBitmap::new(2, 2, bearing, vec![255; 4]).unwrap()
}

#[test]
fn coverage_length_must_match_size() {
    let err = GlyphBitmap::new(3, 2, IntPoint::ZERO, vec![0; 5]).unwrap_err();
    assert!(err.to_string().starts_with("invalid argument:"));
}

#[test]
fn rows_slice_coverage() {
    let g = GlyphBitmap::new(2, 2, IntPoint::ZERO, vec![1, 2, 3, 4]).unwrap();
    assert_eq!(g.row(1), &[3, 4]);
}

#[test]
fn run_bounds_include_bearings() {
    let run: GlyphRun = [
        (IntPoint::new(0, 0), dot(IntPoint::new(0, -2))),
        (IntPoint::new(5, 0), dot(IntPoint::new(1, 0))),
    ]
    .into_iter()
    .collect();
    assert_eq!(run.bounds(), Some(IntBox::new(0, -2, 8, 2)));
}

#[test]
fn empty_glyphs_do_not_extend_bounds() {
    let mut run = GlyphRun::new();
    run.push(
        IntPoint::new(50, 50),
        GlyphBitmap::new(0, 0, IntPoint::ZERO, Vec::new()).unwrap(),
    );
    assert!(run.bounds().is_none());
    run.push(IntPoint::new(1, 1), dot(IntPoint::ZERO));
    assert_eq!(run.bounds(), Some(IntBox::new(1, 1, 3, 3)));
}
