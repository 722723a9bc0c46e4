use super::*;
use crate::raster::scanline::SpanCoverage;

fn rect_path(x0: f64, y0: f64, x1: f64, y1: f64) -> FlatPath {
    let mut p = FlatPath::new();
    p.move_to(Point::new(x0, y0));
    p.line_to(Point::new(x1, y0));
    p.line_to(Point::new(x1, y1));
    p.line_to(Point::new(x0, y1));
    p.close();
    p
}

fn rasterize(paths: &[FlatPath], clip: IntBox, rule: FillRule) -> Rasterizer {
    let mut ras = Rasterizer::new();
    ras.set_clip_box(clip);
    ras.set_fill_rule(rule);
    for p in paths {
        ras.add_path(p);
    }
    ras.finalize();
    ras
}

fn row(ras: &Rasterizer, y: i32, width: usize) -> Vec<u8> {
    let mut out = vec![0u8; width];
    let mut sl = Scanline::new();
    ras.sweep_scanline(&mut sl, y);
    for s in sl.spans() {
        for i in 0..s.len as usize {
            let x = s.x as usize + i;
            out[x] = match s.coverage {
                SpanCoverage::Solid(c) => c,
                SpanCoverage::Mask(m) => m[i],
            };
        }
    }
    out
}

const CLIP: IntBox = IntBox::new(0, 0, 10, 10);

#[test]
fn pixel_aligned_square_is_fully_covered() {
    let ras = rasterize(&[rect_path(2.0, 2.0, 6.0, 6.0)], CLIP, FillRule::NonZero);
    assert!(ras.has_cells());
    assert_eq!(ras.bounds(), Some(IntBox::new(2, 2, 10, 6)));
    for y in 0..10 {
        let expect: Vec<u8> = (0..10)
            .map(|x| if (2..6).contains(&x) && (2..6).contains(&y) { 255 } else { 0 })
            .collect();
        assert_eq!(row(&ras, y, 10), expect, "row {y}");
    }
}

#[test]
fn half_covered_column_gets_half_alpha() {
    let ras = rasterize(&[rect_path(0.0, 0.0, 2.5, 1.0)], CLIP, FillRule::NonZero);
    assert_eq!(&row(&ras, 0, 10)[..4], &[255, 255, 128, 0]);
}

#[test]
fn even_odd_punches_a_hole() {
    let paths = [
        rect_path(0.0, 0.0, 8.0, 8.0),
        rect_path(2.0, 2.0, 6.0, 6.0),
    ];
    let nz = rasterize(&paths, CLIP, FillRule::NonZero);
    let eo = rasterize(&paths, CLIP, FillRule::EvenOdd);
    assert_eq!(row(&nz, 4, 10)[4], 255);
    assert_eq!(row(&eo, 4, 10)[4], 0);
    assert_eq!(row(&eo, 4, 10)[1], 255);
}

#[test]
fn geometry_left_of_clip_keeps_winding() {
    let ras = rasterize(&[rect_path(-5.0, -5.0, 5.0, 5.0)], CLIP, FillRule::NonZero);
    let r = row(&ras, 0, 10);
    assert_eq!(r, vec![255, 255, 255, 255, 255, 0, 0, 0, 0, 0]);
    assert_eq!(row(&ras, 5, 10), vec![0; 10]);
}

#[test]
fn geometry_right_of_clip_fills_to_the_edge() {
    let ras = rasterize(&[rect_path(5.0, 0.0, 20.0, 2.0)], CLIP, FillRule::NonZero);
    assert_eq!(row(&ras, 1, 10), vec![0, 0, 0, 0, 0, 255, 255, 255, 255, 255]);
}

#[test]
fn clipped_sweep_respects_region_row() {
    let ras = rasterize(&[rect_path(0.0, 0.0, 10.0, 10.0)], CLIP, FillRule::NonZero);
    let mut sl = Scanline::new();
    let mut tmp = Scanline::new();
    let boxes = [IntBox::new(1, 0, 3, 10), IntBox::new(7, 0, 8, 10)];
    assert!(ras.sweep_scanline_clipped(&mut sl, &mut tmp, 3, &boxes));
    let spans: Vec<(i32, i32)> = sl.spans().map(|s| (s.x, s.len)).collect();
    assert_eq!(spans, vec![(1, 2), (7, 1)]);
}

#[test]
fn empty_clip_produces_nothing() {
    let ras = rasterize(
        &[rect_path(0.0, 0.0, 5.0, 5.0)],
        IntBox::default(),
        FillRule::NonZero,
    );
    assert!(!ras.has_cells());
    assert_eq!(ras.bounds(), None);
}
