use super::*;

fn collect(sl: &Scanline) -> Vec<(i32, i32, Vec<u8>)> {
    sl.spans()
        .map(|s| {
            let covers = match s.coverage {
                SpanCoverage::Solid(c) => vec![c; s.len as usize],
                SpanCoverage::Mask(m) => m.to_vec(),
            };
            (s.x, s.len, covers)
        })
        .collect()
}

#[test]
fn adjacent_pushes_merge() {
    let mut sl = Scanline::new();
    sl.reset(3);
    sl.push_cell(0, 10);
    sl.push_cell(1, 20);
    sl.push_solid(2, 3, 255);
    sl.push_solid(5, 1, 255);
    sl.push_solid(6, 4, 0);
    assert_eq!(sl.span_count(), 2);
    assert_eq!(
        collect(&sl),
        vec![(0, 2, vec![10, 20]), (2, 4, vec![255; 4])]
    );
}

#[test]
fn clip_into_splits_by_boxes() {
    let mut sl = Scanline::new();
    sl.reset(0);
    sl.push_mask(0, &[1, 2, 3, 4, 5, 6]);
    sl.push_solid(6, 6, 200);
    let boxes = [IntBox::new(2, 0, 4, 1), IntBox::new(5, 0, 8, 1)];
    let mut out = Scanline::new();
    sl.clip_into(&boxes, &mut out);
    assert_eq!(
        collect(&out),
        vec![
            (2, 2, vec![3, 4]),
            (5, 1, vec![6]),
            (6, 2, vec![200, 200]),
        ]
    );
}
