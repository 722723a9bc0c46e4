use super::*;

fn row(vals: &[u32]) -> Vec<AtomicU32> {
    vals.iter().map(|&v| AtomicU32::new(v)).collect()
}

fn read(r: &[AtomicU32]) -> Vec<u32> {
    r.iter().map(|p| p.load(Ordering::Relaxed)).collect()
}

#[test]
fn solid_full_coverage_fills() {
    let f = CompositeFuncs::get(PixelFormat::Prgb32, Operator::SrcOver);
    let dst = row(&[0; 4]);
    f.cspan(&dst, 0xFFFF_0000, SpanCoverage::Solid(255));
    assert_eq!(read(&dst), vec![0xFFFF_0000; 4]);
}

#[test]
fn partial_coverage_interpolates() {
    let f = CompositeFuncs::get(PixelFormat::Prgb32, Operator::Src);
    let dst = row(&[0, 0, 0]);
    f.cspan(&dst, 0xFFFF_FFFF, SpanCoverage::Mask(&[0, 128, 255]));
    assert_eq!(read(&dst), vec![0, 0x8080_8080, 0xFFFF_FFFF]);
}

#[test]
fn dst_operator_is_a_no_op() {
    let f = CompositeFuncs::get(PixelFormat::Prgb32, Operator::Dst);
    let dst = row(&[0x1234_5678]);
    f.cspan(&dst, 0xFFFF_FFFF, SpanCoverage::Solid(255));
    assert_eq!(read(&dst), vec![0x1234_5678]);
}

#[test]
fn xrgb_targets_stay_opaque() {
    let f = CompositeFuncs::get(PixelFormat::Xrgb32, Operator::Src);
    let dst = row(&[0]);
    f.cspan(&dst, 0x8080_0000, SpanCoverage::Solid(255));
    assert_eq!(read(&dst), vec![0xFF80_0000]);
}

#[test]
fn argb_targets_store_straight_alpha() {
    let f = CompositeFuncs::get(PixelFormat::Argb32, Operator::Src);
    let dst = row(&[0]);
    f.cspan(&dst, 0x8080_0000, SpanCoverage::Solid(255));
    assert_eq!(read(&dst), vec![0x80FF_0000]);
}

#[test]
fn variable_span_with_mask() {
    let f = CompositeFuncs::get(PixelFormat::Prgb32, Operator::SrcOver);
    let dst = row(&[0xFF00_0000, 0xFF00_0000]);
    f.vspan(
        &dst,
        &[0xFF00_FF00, 0xFF00_00FF],
        SpanCoverage::Mask(&[255, 0]),
    );
    assert_eq!(read(&dst), vec![0xFF00_FF00, 0xFF00_0000]);
}

#[test]
fn filter_span_ignores_operator() {
    let f = CompositeFuncs::get(PixelFormat::Prgb32, Operator::Clear);
    let dst = row(&[0xFF00_0000, 0xFF00_0000]);
    f.filter_span(&dst, &ColorFilter::invert(), SpanCoverage::Mask(&[255, 0]));
    assert_eq!(read(&dst), vec![0xFFFF_FFFF, 0xFF00_0000]);
}
