use super::*;
use crate::foundation::error::PaintError;
use crate::pattern::GradientStop;
use crate::text::glyph::GlyphBitmap;

const RED: u32 = 0xFFFF_0000;
const GREEN: u32 = 0xFF00_FF00;

fn st_opts() -> EngineOpts {
    EngineOpts::default().with_mode(EngineMode::SingleThreaded)
}

fn engine(size: u32) -> PaintEngine {
    let image = Image::new(size, size, PixelFormat::Prgb32).unwrap();
    let mut e = PaintEngine::begin(image, st_opts()).unwrap();
    e.set_source_argb(Argb(RED));
    e
}

fn leaked_pool(max: usize) -> &'static WorkerThreadPool {
    Box::leak(Box::new(WorkerThreadPool::new(max)))
}

fn count(e: &PaintEngine, value: u32) -> usize {
    e.target().to_vec().iter().filter(|&&p| p == value).count()
}

mod lifecycle {
    use super::*;

    #[test]
    fn alpha_only_targets_are_rejected() {
        let image = Image::new(4, 4, PixelFormat::A8).unwrap();
        let err = PaintEngine::begin(image, st_opts()).unwrap_err();
        assert!(matches!(err, PaintError::UnsupportedFormat(PixelFormat::A8)));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let image = Image::new(4, 4, PixelFormat::Prgb32).unwrap();
        let opts = st_opts().with_queue_capacity(0);
        assert!(PaintEngine::begin(image, opts).is_err());
    }

    #[test]
    fn end_returns_the_painted_target() {
        let mut e = engine(8);
        e.fill_box(IntBox::new(0, 0, 8, 8));
        let image = e.end().unwrap();
        assert!(image.to_vec().iter().all(|&p| p == RED));
    }

    #[test]
    fn small_targets_stay_single_threaded_in_auto_mode() {
        let image = Image::new(8, 8, PixelFormat::Prgb32).unwrap();
        let e = PaintEngine::begin_with_pool(image, EngineOpts::default(), leaked_pool(4))
            .unwrap();
        assert_eq!(e.engine_mode(), EngineMode::SingleThreaded);
        assert_eq!(e.worker_count(), 0);
    }
}

mod drawing {
    use super::*;

    #[test]
    fn aligned_rect_fills_exact_pixels() {
        let mut e = engine(16);
        e.fill_rect(Rect::new(2.0, 2.0, 6.0, 6.0));
        assert_eq!(count(&e, RED), 16);
        assert_eq!(e.target().pixel(2, 2), Some(RED));
        assert_eq!(e.target().pixel(6, 6), Some(0));
    }

    #[test]
    fn half_pixel_rect_has_partial_edges() {
        let mut e = engine(8);
        e.fill_rect(Rect::new(1.5, 1.0, 3.0, 2.0));
        assert_eq!(e.target().pixel(2, 1), Some(RED));
        let edge = e.target().pixel(1, 1).unwrap();
        assert!(edge != 0 && edge != RED, "{edge:#x}");
    }

    #[test]
    fn degenerate_rects_draw_nothing() {
        let mut e = engine(8);
        e.fill_rect(Rect::new(2.0, 2.0, 2.0, 6.0));
        e.fill_box(IntBox::new(5, 5, 3, 3));
        e.fill_polygon(&[]);
        assert_eq!(count(&e, 0), 64);
    }

    #[test]
    fn ellipse_stays_inside_its_bounds() {
        let mut e = engine(32);
        e.fill_ellipse(Point::new(16.0, 16.0), Vec2::new(8.0, 4.0));
        assert_eq!(e.target().pixel(16, 16), Some(RED));
        assert_eq!(e.target().pixel(16, 10), Some(0));
        assert_eq!(e.target().pixel(5, 16), Some(0));
    }

    #[test]
    fn pie_covers_one_quadrant() {
        let mut e = engine(32);
        e.fill_pie(
            Point::new(16.0, 16.0),
            Vec2::new(12.0, 12.0),
            0.0,
            std::f64::consts::FRAC_PI_2,
        );
        assert_eq!(e.target().pixel(20, 20), Some(RED));
        assert_eq!(e.target().pixel(10, 10), Some(0));
        assert_eq!(e.target().pixel(20, 10), Some(0));
    }

    #[test]
    fn stroke_leaves_the_interior_empty() {
        let mut e = engine(32);
        e.set_line_width(2.0);
        e.draw_rect(Rect::new(4.0, 4.0, 28.0, 28.0));
        assert_eq!(e.target().pixel(4, 16), Some(RED));
        assert_eq!(e.target().pixel(16, 16), Some(0));
    }

    #[test]
    fn zero_width_strokes_draw_nothing() {
        let mut e = engine(16);
        e.set_line_width(0.0);
        e.draw_line(Point::new(0.0, 8.0), Point::new(16.0, 8.0));
        assert_eq!(count(&e, 0), 256);
    }

    #[test]
    fn points_cover_one_line_width() {
        let mut e = engine(8);
        e.draw_point_at(IntPoint::new(3, 4));
        assert_eq!(count(&e, RED), 1);
        assert_eq!(e.target().pixel(3, 4), Some(RED));

        e.set_line_width(2.0);
        e.draw_point(Point::new(6.0, 6.0));
        assert_eq!(count(&e, RED), 5);
        assert_eq!(e.target().pixel(5, 5), Some(RED));

        e.set_line_width(0.0);
        e.draw_point_at(IntPoint::new(0, 0));
        assert_eq!(e.target().pixel(0, 0), Some(0));
    }

    #[test]
    fn lines_end_flush_with_their_endpoints() {
        let mut e = engine(16);
        e.set_line_width(2.0);
        e.draw_line(Point::new(4.0, 8.0), Point::new(12.0, 8.0));
        assert_eq!(e.target().pixel(4, 7), Some(RED));
        assert_eq!(e.target().pixel(11, 8), Some(RED));
        assert_eq!(e.target().pixel(3, 7), Some(0));
        assert_eq!(e.target().pixel(12, 8), Some(0));
    }

    #[test]
    fn clear_fills_the_whole_clip() {
        let mut e = engine(8);
        e.set_user_region(Some(Region::from_boxes(&[
            IntBox::new(0, 0, 2, 2),
            IntBox::new(6, 6, 8, 8),
        ])));
        e.clear();
        assert_eq!(count(&e, RED), 8);
    }

    #[test]
    fn operator_applies_to_fills() {
        let mut e = engine(4);
        e.fill_box(IntBox::new(0, 0, 4, 4));
        e.set_operator(Operator::Clear);
        e.fill_box(IntBox::new(0, 0, 2, 4));
        assert_eq!(count(&e, RED), 8);
    }

    #[test]
    fn color_filter_rewrites_destination() {
        let mut e = engine(4);
        e.fill_box(IntBox::new(0, 0, 4, 4));
        e.set_source_color_filter(ColorFilter::invert());
        e.fill_box(IntBox::new(0, 0, 1, 1));
        assert_eq!(e.target().pixel(0, 0), Some(0xFF00_FFFF));
        assert_eq!(e.target().pixel(1, 0), Some(RED));
    }

    #[test]
    fn gradient_source_paints_a_ramp() {
        let mut e = engine(16);
        e.set_source_pattern(Pattern::linear_gradient(
            Point::new(0.0, 0.0),
            Point::new(16.0, 0.0),
            vec![
                GradientStop::new(0.0, Argb(0xFF00_0000)),
                GradientStop::new(1.0, Argb(0xFFFF_FFFF)),
            ],
        ));
        e.fill_box(IntBox::new(0, 0, 16, 1));
        let left = e.target().pixel(0, 0).unwrap() & 0xFF;
        let right = e.target().pixel(15, 0).unwrap() & 0xFF;
        assert!(left < right, "{left} < {right}");
    }

    #[test]
    fn broken_pattern_skips_the_draw() {
        let mut e = engine(8);
        e.set_source_pattern(Pattern::linear_gradient(
            Point::new(1.0, 1.0),
            Point::new(1.0, 1.0),
            vec![GradientStop::new(0.0, Argb(RED))],
        ));
        e.fill_box(IntBox::new(0, 0, 8, 8));
        e.fill_rect(Rect::new(0.5, 0.5, 4.0, 4.0));
        assert_eq!(count(&e, 0), 64);
    }
}

mod images {
    use super::*;

    fn green(size: u32) -> Image {
        let img = Image::new(size, size, PixelFormat::Prgb32).unwrap();
        img.fill(GREEN);
        img
    }

    #[test]
    fn translated_blit_copies_pixels() {
        let mut e = engine(8);
        e.blit_image_at(IntPoint::new(6, 6), &green(4), None);
        assert_eq!(count(&e, GREEN), 4);
        assert_eq!(e.target().pixel(7, 7), Some(GREEN));
    }

    #[test]
    fn blit_honors_the_source_rect() {
        let src = Image::new(4, 1, PixelFormat::Prgb32).unwrap();
        src.set_pixel(2, 0, GREEN);
        let mut e = engine(4);
        e.blit_image_at(IntPoint::ZERO, &src, Some(IntBox::new(2, 0, 3, 1)));
        assert_eq!(e.target().pixel(0, 0), Some(GREEN));
        assert_eq!(e.target().pixel(1, 0), Some(0));
    }

    #[test]
    fn scaled_blit_covers_the_scaled_area() {
        let mut e = engine(8);
        e.set_image_interpolation(Interpolation::Nearest);
        e.scale(2.0, 2.0, MatrixOrder::Prepend);
        e.blit_image(Point::ZERO, &green(2), None);
        assert_eq!(count(&e, GREEN), 16);
        assert_eq!(e.target().pixel(4, 4), Some(0));
    }
}

mod glyphs {
    use super::*;

    fn run() -> GlyphRun {
        [
            (
                IntPoint::ZERO,
                GlyphBitmap::new(2, 2, IntPoint::ZERO, vec![255; 4]).unwrap(),
            ),
            (
                IntPoint::new(4, 0),
                GlyphBitmap::new(1, 1, IntPoint::ZERO, vec![255]).unwrap(),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn glyphs_land_at_the_rounded_origin() {
        let mut e = engine(16);
        e.draw_glyph_run(Point::new(2.6, 3.2), &run(), None);
        assert_eq!(e.target().pixel(3, 3), Some(RED));
        assert_eq!(e.target().pixel(4, 4), Some(RED));
        assert_eq!(e.target().pixel(7, 3), Some(RED));
        assert_eq!(count(&e, RED), 5);
    }

    #[test]
    fn glyph_clip_is_applied() {
        let mut e = engine(16);
        e.draw_glyph_run(Point::ZERO, &run(), Some(IntBox::new(0, 0, 1, 16)));
        assert_eq!(count(&e, RED), 2);
    }
}

mod state {
    use super::*;

    #[test]
    fn user_clip_box_limits_fills() {
        let mut e = engine(16);
        e.set_user_clip_box(IntBox::new(0, 0, 4, 4));
        e.fill_box(IntBox::new(0, 0, 16, 16));
        assert_eq!(count(&e, RED), 16);
        assert_eq!(e.clip_box(), Some(IntBox::new(0, 0, 4, 4)));
    }

    #[test]
    fn meta_origin_shifts_user_space() {
        let mut e = engine(16);
        e.set_meta_vars(IntPoint::new(4, 4), None);
        e.set_user_origin(IntPoint::new(1, 0));
        e.fill_box(IntBox::new(0, 0, 2, 2));
        assert_eq!(e.target().pixel(5, 4), Some(RED));
        assert_eq!(e.target().pixel(0, 0), Some(0));
        assert_eq!(e.world_to_screen(Point::ZERO), Point::new(5.0, 4.0));
    }

    #[test]
    fn user_region_is_relative_to_meta_origin() {
        let mut e = engine(16);
        e.set_meta_vars(IntPoint::new(8, 0), Some(Region::from_box(IntBox::new(8, 0, 16, 16))));
        e.set_user_clip_box(IntBox::new(-4, 0, 2, 2));
        assert_eq!(e.clip_box(), Some(IntBox::new(8, 0, 10, 2)));
        e.reset_user_vars();
        e.reset_meta_vars();
        assert_eq!(e.clip_box(), Some(IntBox::new(0, 0, 16, 16)));
    }

    #[test]
    fn disjoint_clip_paints_nothing() {
        let mut e = engine(8);
        e.set_user_clip_box(IntBox::new(20, 20, 30, 30));
        assert_eq!(e.clip_box(), None);
        e.fill_rect(Rect::new(0.0, 0.0, 8.0, 8.0));
        e.clear();
        assert_eq!(count(&e, 0), 64);
    }

    #[test]
    fn restore_brings_back_source_and_clip() {
        let mut e = engine(8);
        e.save();
        e.set_source_argb(Argb(GREEN));
        e.set_user_clip_box(IntBox::new(0, 0, 1, 1));
        e.translate(3.0, 0.0, MatrixOrder::Prepend);
        assert_eq!(e.saved_states(), 1);
        e.restore();
        assert!(matches!(e.source(), Source::Solid(c) if c.argb() == Argb(RED)));
        assert_eq!(e.clip_box(), Some(IntBox::new(0, 0, 8, 8)));
        assert_eq!(e.transform(), Affine::IDENTITY);
        e.restore();
        assert_eq!(e.saved_states(), 0);
    }

    #[test]
    fn invalid_stroke_values_are_ignored() {
        let mut e = engine(4);
        e.set_line_width(3.0);
        e.set_line_width(-1.0);
        e.set_line_width(f64::NAN);
        assert_eq!(e.stroke().width, 3.0);
        e.set_miter_limit(f64::INFINITY);
        assert_eq!(e.stroke().miter_limit, 4.0);
        e.set_dashes(0.0, &[2.0, 1.0]);
        e.set_dashes(0.0, &[2.0, -1.0]);
        e.set_dashes(0.0, &[0.0, 0.0]);
        assert_eq!(&e.stroke().dash_pattern[..], &[2.0, 1.0]);
        e.set_dashes(0.0, &[]);
        assert!(e.stroke().dash_pattern.is_empty());
    }

    #[test]
    fn caps_setters_round_trip() {
        let mut e = engine(4);
        e.set_fill_rule(FillRule::EvenOdd);
        e.set_line_caps(Cap::Round);
        e.set_line_join(Join::Bevel);
        e.set_operator(Operator::Xor);
        assert_eq!(e.fill_rule(), FillRule::EvenOdd);
        assert_eq!(e.stroke().start_cap, Cap::Round);
        assert_eq!(e.stroke().end_cap, Cap::Round);
        assert_eq!(e.stroke().join, Join::Bevel);
        assert_eq!(e.operator(), Operator::Xor);
    }

    #[test]
    fn matrix_order_controls_composition() {
        let mut e = engine(4);
        e.scale(2.0, 2.0, MatrixOrder::Prepend);
        e.translate(1.0, 0.0, MatrixOrder::Prepend);
        assert_eq!(e.world_to_screen(Point::ZERO), Point::new(2.0, 0.0));

        e.reset_transform();
        e.scale(2.0, 2.0, MatrixOrder::Prepend);
        e.translate(1.0, 0.0, MatrixOrder::Append);
        assert_eq!(e.world_to_screen(Point::ZERO), Point::new(1.0, 0.0));
    }

    #[test]
    fn non_finite_transforms_are_ignored() {
        let mut e = engine(4);
        e.translate(1.0, 1.0, MatrixOrder::Prepend);
        e.set_transform(Affine::new([f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0]));
        assert_eq!(e.transform(), Affine::translate((1.0, 1.0)));
    }

    #[test]
    fn screen_to_world_inverts_the_transform() {
        let mut e = engine(4);
        e.scale(2.0, 4.0, MatrixOrder::Prepend);
        let p = e.screen_to_world(Point::new(4.0, 8.0)).unwrap();
        assert!((p.x - 2.0).abs() < 1e-9 && (p.y - 2.0).abs() < 1e-9);
        e.set_transform(Affine::scale(0.0));
        assert!(e.screen_to_world(Point::ZERO).is_none());
    }
}

mod engine_mode {
    use super::*;

    fn shapes(e: &mut PaintEngine) {
        e.set_source_argb(Argb(RED));
        e.fill_box(IntBox::new(1, 1, 20, 7));
        e.fill_ellipse(Point::new(16.0, 16.0), Vec2::new(10.0, 6.5));
        e.set_source_argb(Argb(0x8000_80FF));
        e.draw_polyline(&[Point::new(2.0, 30.0), Point::new(30.0, 2.5), Point::new(31.0, 31.0)]);
        e.rotate(0.3, MatrixOrder::Prepend);
        e.fill_rect(Rect::new(8.0, 0.0, 14.0, 6.0));
    }

    #[test]
    fn multithreaded_output_matches_single_threaded() {
        let mut st = engine(32);
        shapes(&mut st);
        let expected = st.end().unwrap().to_vec();

        let image = Image::new(32, 32, PixelFormat::Prgb32).unwrap();
        let opts = EngineOpts::default()
            .with_mode(EngineMode::MultiThreaded)
            .with_threads(Some(3));
        let mut mt = PaintEngine::begin_with_pool(image, opts, leaked_pool(3)).unwrap();
        assert_eq!(mt.worker_count(), 3);
        shapes(&mut mt);
        assert_eq!(mt.end().unwrap().to_vec(), expected);
    }

    #[test]
    fn switching_modes_keeps_pending_work() {
        let pool = leaked_pool(2);
        let image = Image::new(8, 8, PixelFormat::Prgb32).unwrap();
        let mut e = PaintEngine::begin_with_pool(image, st_opts(), pool).unwrap();
        e.set_source_argb(Argb(RED));
        e.set_engine(EngineMode::MultiThreaded, Some(2));
        assert_eq!(e.engine_mode(), EngineMode::MultiThreaded);
        assert_eq!(pool.leased(), 2);
        e.fill_box(IntBox::new(0, 0, 8, 4));
        e.set_engine(EngineMode::SingleThreaded, None);
        assert_eq!(pool.leased(), 0);
        e.fill_box(IntBox::new(0, 4, 8, 8));
        assert_eq!(count(&e, RED), 64);
    }

    #[test]
    fn falls_back_when_the_pool_is_too_small() {
        let image = Image::new(8, 8, PixelFormat::Prgb32).unwrap();
        let opts = EngineOpts::default().with_mode(EngineMode::MultiThreaded);
        let mut e = PaintEngine::begin_with_pool(image, opts, leaked_pool(1)).unwrap();
        assert_eq!(e.engine_mode(), EngineMode::SingleThreaded);
        e.set_source_argb(Argb(RED));
        e.fill_box(IntBox::new(0, 0, 8, 8));
        assert_eq!(count(&e, RED), 64);
    }

    #[test]
    fn full_queue_forces_a_flush() {
        let image = Image::new(8, 8, PixelFormat::Prgb32).unwrap();
        let opts = EngineOpts::default()
            .with_mode(EngineMode::MultiThreaded)
            .with_threads(Some(2))
            .with_queue_capacity(2);
        let mut e = PaintEngine::begin_with_pool(image, opts, leaked_pool(2)).unwrap();
        e.set_source_argb(Argb(RED));
        for y in 0..8 {
            e.fill_box(IntBox::new(0, y, 8, y + 1));
        }
        e.flush();
        assert_eq!(count(&e, RED), 64);
        let stats = e.stats();
        assert_eq!(stats.commands_posted, 8);
        assert_eq!(stats.commands_released, 8);
        assert!(stats.flushes >= 4, "{stats:?}");
        // All eight box payloads fit in one block.
        assert_eq!(stats.arena_blocks_allocated, 1);
        assert_eq!(stats.arena_live_blocks, 1);
    }
}
