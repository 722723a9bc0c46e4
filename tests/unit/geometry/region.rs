use super::*;

fn b(x: i32, y: i32, w: i32, h: i32) -> IntBox {
    IntBox::from_xywh(x, y, w, h)
}

#[test]
fn overlapping_boxes_normalize_into_bands() {
    let r = Region::from_boxes(&[b(0, 0, 10, 10), b(5, 5, 10, 10)]);
    assert_eq!(
        r.boxes(),
        &[
            IntBox::new(0, 0, 10, 5),
            IntBox::new(0, 5, 15, 10),
            IntBox::new(5, 10, 15, 15),
        ]
    );
    assert_eq!(r.extents(), Some(IntBox::new(0, 0, 15, 15)));
    assert!(!r.is_rect());
}

#[test]
fn stacked_identical_bands_coalesce() {
    let r = Region::from_boxes(&[b(0, 0, 4, 2), b(0, 2, 4, 2), b(10, 0, 2, 4)]);
    assert_eq!(
        r.boxes(),
        &[IntBox::new(0, 0, 4, 4), IntBox::new(10, 0, 12, 4)]
    );
}

#[test]
fn touching_boxes_merge_horizontally() {
    let r = Region::from_boxes(&[b(0, 0, 4, 4), b(4, 0, 4, 4)]);
    assert!(r.is_rect());
    assert_eq!(r.boxes(), &[IntBox::new(0, 0, 8, 4)]);
}

#[test]
fn intersect_keeps_only_shared_pixels() {
    let a = Region::from_boxes(&[b(0, 0, 10, 10), b(20, 0, 10, 10)]);
    let c = Region::from_box(b(5, 5, 20, 20));
    let r = a.intersect(&c);
    assert_eq!(
        r.boxes(),
        &[IntBox::new(5, 5, 10, 10), IntBox::new(20, 5, 25, 10)]
    );
    for y in 0..30 {
        for x in 0..30 {
            assert_eq!(r.contains(x, y), a.contains(x, y) && c.contains(x, y));
        }
    }
}

#[test]
fn disjoint_intersection_is_empty() {
    let r = Region::from_box(b(0, 0, 5, 5)).intersect_box(b(10, 10, 5, 5));
    assert!(r.is_empty());
    assert!(r.is_rect());
    assert_eq!(r.extents(), None);
}

#[test]
fn translate_moves_every_box() {
    let r = Region::from_boxes(&[b(0, 0, 2, 2), b(4, 0, 2, 2)]).translate(3, -1);
    assert_eq!(
        r.boxes(),
        &[IntBox::new(3, -1, 5, 1), IntBox::new(7, -1, 9, 1)]
    );
}

#[test]
fn row_boxes_returns_the_band_for_a_row() {
    let r = Region::from_boxes(&[b(0, 0, 10, 10), b(5, 5, 10, 10)]);
    assert_eq!(r.row_boxes(7), &[IntBox::new(0, 5, 15, 10)]);
    assert_eq!(r.row_boxes(14), &[IntBox::new(5, 10, 15, 15)]);
    assert!(r.row_boxes(15).is_empty());
    assert!(r.row_boxes(-1).is_empty());
}
