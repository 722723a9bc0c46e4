use std::sync::Arc;

use kurbo::{Cap, Ellipse, Join, Line, RoundedRect, Shape, Stroke};

use crate::composite::operator::Operator;
use crate::engine::action::{
    Calculation, Command, CommandKind, MAX_BOXES_PER_COMMAND, MAX_GLYPHS_PER_COMMAND,
    encode_boxes, encode_placements,
};
use crate::engine::opts::{EngineMode, EngineOpts, clamp_workers};
use crate::engine::stats::{PaintStats, StatsCounters};
use crate::engine::thread_pool::WorkerThreadPool;
use crate::engine::worker::{WorkerConfig, WorkerManager};
use crate::foundation::core::{
    Affine, Argb, BezPath, IntBox, IntPoint, Point, Rect, Vec2, is_pixel_aligned,
};
use crate::foundation::error::PaintResult;
use crate::geometry::region::Region;
use crate::memory::arena::Arena;
use crate::pattern::context::PatternContext;
use crate::pattern::filter::ColorFilter;
use crate::pattern::{Interpolation, Pattern, Spread};
use crate::raster::pool::{RasterizerPool, RasterizerPoolOpts};
use crate::raster::rasterizer::FillRule;
use crate::render::context::{PathMode, RenderContext};
use crate::state::caps::{CapsState, Source, TransformKind};
use crate::state::clip::ClipState;
use crate::state::stored::{StateStack, StoredState};
use crate::surface::format::PixelFormat;
use crate::surface::image::{Image, Layer};
use crate::text::glyph::{GlyphRun, glyph_box};

// Accuracy of the curves kurbo emits for ellipses and rounded corners.
const SHAPE_TOLERANCE: f64 = 0.1;

/// Where a new matrix goes relative to the current transform.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum MatrixOrder {
    /// `current * op`: the operation applies in user space, before the current transform.
    #[default]
    Prepend,
    /// `op * current`: the operation applies after the current transform.
    Append,
}

/// Raster painter over one target image.
///
/// Every draw call either renders immediately on the calling thread or, in
/// multithreaded mode, is queued for the worker tasks. Queued work is
/// guaranteed to be in the target after [`PaintEngine::flush`] or
/// [`PaintEngine::end`].
pub struct PaintEngine {
    ctx: RenderContext,
    stack: StateStack,
    arena: Arena,
    raster_pool: Arc<RasterizerPool>,
    stats: Arc<StatsCounters>,
    workers: Option<WorkerManager>,
    thread_pool: &'static WorkerThreadPool,
    opts: EngineOpts,
}

impl std::fmt::Debug for PaintEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaintEngine")
            .field("target", &self.ctx.layer.image)
            .field("mode", &self.engine_mode())
            .field("workers", &self.worker_count())
            .finish_non_exhaustive()
    }
}

impl PaintEngine {
    /// Start painting into `target` using the global worker pool.
    pub fn begin(target: Image, opts: EngineOpts) -> PaintResult<Self> {
        Self::begin_with_pool(target, opts, WorkerThreadPool::global())
    }

    /// Start painting into `target`, leasing worker threads from `pool`.
    pub fn begin_with_pool(
        target: Image,
        opts: EngineOpts,
        pool: &'static WorkerThreadPool,
    ) -> PaintResult<Self> {
        opts.validate()?;
        let layer = Arc::new(Layer::new(target)?);
        let clip = Arc::new(ClipState::new(layer.bounds()));
        let caps = Arc::new(CapsState::default());
        let mut engine = Self {
            ctx: RenderContext::main(layer, clip, caps),
            stack: StateStack::default(),
            arena: Arena::new(opts.arena_block_words),
            raster_pool: Arc::new(RasterizerPool::new(RasterizerPoolOpts::default())),
            stats: Arc::new(StatsCounters::default()),
            workers: None,
            thread_pool: pool,
            opts,
        };
        engine.set_engine(engine.opts.mode, engine.opts.threads);
        Ok(engine)
    }

    /// Finish all queued work, stop the workers and return the target.
    pub fn end(mut self) -> PaintResult<Image> {
        self.flush();
        if let Some(mut workers) = self.workers.take() {
            workers.shutdown();
        }
        Ok(self.ctx.layer.image.clone())
    }

    /// Target image.
    pub fn target(&self) -> &Image {
        &self.ctx.layer.image
    }

    /// Target width in pixels.
    pub fn width(&self) -> u32 {
        self.ctx.layer.width as u32
    }

    /// Target height in pixels.
    pub fn height(&self) -> u32 {
        self.ctx.layer.height as u32
    }

    /// Target pixel format.
    pub fn format(&self) -> PixelFormat {
        self.ctx.layer.format
    }

    // ---------------------------------------------------------------------
    // Engine mode

    /// Switch between single-threaded and multithreaded rendering.
    ///
    /// Queued work is flushed first. `threads` is clamped to `2..=16`; when
    /// the pool cannot lend two threads the engine stays single-threaded.
    #[tracing::instrument(skip(self))]
    pub fn set_engine(&mut self, mode: EngineMode, threads: Option<usize>) {
        let multithreaded = match mode {
            EngineMode::SingleThreaded => false,
            EngineMode::MultiThreaded => true,
            EngineMode::Auto => {
                let area = u64::from(self.width()) * u64::from(self.height());
                area >= self.opts.auto_threshold_pixels
            }
        };
        let wanted = threads
            .map(clamp_workers)
            .unwrap_or_else(|| self.opts.resolved_threads());

        if let Some(workers) = &self.workers
            && multithreaded
            && workers.worker_count() == wanted
        {
            return;
        }

        self.flush();
        if let Some(mut workers) = self.workers.take() {
            workers.shutdown();
            self.arena.reset();
            tracing::debug!("left multithreaded mode");
        }
        if !multithreaded {
            return;
        }

        let config = WorkerConfig {
            threads: wanted,
            queue_capacity: self.opts.queue_capacity,
            idle_retries: self.opts.idle_retries,
            wake_interval: self.opts.wake_interval,
        };
        self.workers = WorkerManager::start(
            self.thread_pool,
            config,
            &self.ctx,
            Arc::clone(&self.raster_pool),
            Arc::clone(&self.stats),
        );
        if let Some(workers) = &self.workers {
            tracing::debug!(workers = workers.worker_count(), "entered multithreaded mode");
        }
    }

    /// Mode the engine is actually running in.
    pub fn engine_mode(&self) -> EngineMode {
        if self.workers.is_some() {
            EngineMode::MultiThreaded
        } else {
            EngineMode::SingleThreaded
        }
    }

    /// Number of worker tasks; zero when single-threaded.
    pub fn worker_count(&self) -> usize {
        self.workers.as_ref().map_or(0, WorkerManager::worker_count)
    }

    /// Wait until every queued draw call has reached the target.
    #[tracing::instrument(skip(self))]
    pub fn flush(&mut self) {
        if let Some(workers) = self.workers.as_mut() {
            workers.flush();
        }
    }

    /// Work counters since `begin`, including rasterizer pool and arena
    /// usage.
    pub fn stats(&self) -> PaintStats {
        let rasterizers = self.raster_pool.stats();
        let arena = self.arena.stats();
        PaintStats {
            rasterizers_created: rasterizers.created,
            rasterizers_reused: rasterizers.reused,
            rasterizers_dropped: rasterizers.dropped_on_release,
            rasterizers_retained: rasterizers.retained,
            arena_blocks_allocated: arena.system_blocks,
            arena_blocks_reused: arena.reused_blocks,
            arena_live_blocks: arena.live_blocks,
            ..self.stats.snapshot()
        }
    }

    // ---------------------------------------------------------------------
    // State stack

    /// Push the current clip, caps and pattern context.
    pub fn save(&mut self) {
        self.stack.push(StoredState {
            clip: Arc::clone(&self.ctx.clip),
            caps: Arc::clone(&self.ctx.caps),
            pattern: self.ctx.pattern.clone(),
        });
    }

    /// Pop the newest saved state. Does nothing when none is saved.
    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.ctx.clip = state.clip;
            self.ctx.caps = state.caps;
            self.ctx.pattern = state.pattern;
        }
    }

    /// Number of saved states.
    pub fn saved_states(&self) -> usize {
        self.stack.depth()
    }

    // ---------------------------------------------------------------------
    // Clipping

    fn update_clip(&mut self, f: impl FnOnce(&mut ClipState)) {
        let bounds = self.ctx.layer.bounds();
        let clip = Arc::make_mut(&mut self.ctx.clip);
        f(clip);
        if clip.update_work_region(bounds) {
            let origin = clip.work_origin;
            Arc::make_mut(&mut self.ctx.caps).update_transform(origin);
            self.ctx.pattern = None;
        }
    }

    /// Set the surface owner's origin and clip region (layer pixels).
    pub fn set_meta_vars(&mut self, origin: IntPoint, region: Option<Region>) {
        self.update_clip(|c| {
            c.meta_origin = origin;
            c.meta_region = region;
        });
    }

    /// Clear the meta origin and region.
    pub fn reset_meta_vars(&mut self) {
        self.set_meta_vars(IntPoint::ZERO, None);
    }

    /// Set the caller origin, relative to the meta origin.
    pub fn set_user_origin(&mut self, origin: IntPoint) {
        self.update_clip(|c| c.user_origin = origin);
    }

    /// Shift the caller origin.
    pub fn translate_user_origin(&mut self, dx: i32, dy: i32) {
        self.update_clip(|c| c.user_origin = c.user_origin.offset(dx, dy));
    }

    /// Set the caller clip region, relative to the meta origin. `None` removes it.
    pub fn set_user_region(&mut self, region: Option<Region>) {
        self.update_clip(|c| c.user_region = region);
    }

    /// Clip to a single box, relative to the meta origin.
    pub fn set_user_clip_box(&mut self, b: IntBox) {
        self.set_user_region(Some(Region::from_box(b)));
    }

    /// Clear the caller origin and region.
    pub fn reset_user_vars(&mut self) {
        self.update_clip(|c| {
            c.user_origin = IntPoint::ZERO;
            c.user_region = None;
        });
    }

    /// Meta origin.
    pub fn meta_origin(&self) -> IntPoint {
        self.ctx.clip.meta_origin
    }

    /// Meta region, if any.
    pub fn meta_region(&self) -> Option<&Region> {
        self.ctx.clip.meta_region.as_ref()
    }

    /// Caller origin.
    pub fn user_origin(&self) -> IntPoint {
        self.ctx.clip.user_origin
    }

    /// Caller region, if any.
    pub fn user_region(&self) -> Option<&Region> {
        self.ctx.clip.user_region.as_ref()
    }

    /// Bounding box of the effective clip in layer pixels; `None` when nothing is paintable.
    pub fn clip_box(&self) -> Option<IntBox> {
        let b = self.ctx.clip.clip_box;
        b.is_valid().then_some(b)
    }

    // ---------------------------------------------------------------------
    // Caps

    fn update_caps(&mut self, f: impl FnOnce(&mut CapsState)) {
        f(Arc::make_mut(&mut self.ctx.caps));
    }

    /// Compositing operator.
    pub fn operator(&self) -> Operator {
        self.ctx.caps.op
    }

    /// Set the compositing operator.
    pub fn set_operator(&mut self, op: Operator) {
        self.update_caps(|c| c.op = op);
    }

    /// Current source.
    pub fn source(&self) -> Source {
        self.ctx.caps.source.clone()
    }

    fn set_source(&mut self, source: Source) {
        self.update_caps(|c| c.source = source);
        self.ctx.pattern = None;
    }

    /// Paint with a solid color.
    pub fn set_source_argb(&mut self, color: Argb) {
        self.set_source(Source::solid(color));
    }

    /// Paint with a texture or gradient.
    pub fn set_source_pattern(&mut self, pattern: Pattern) {
        self.set_source(Source::Pattern(Arc::new(pattern)));
    }

    /// Rewrite covered destination pixels through a color matrix.
    pub fn set_source_color_filter(&mut self, filter: ColorFilter) {
        self.set_source(Source::Filter(Arc::new(filter)));
    }

    /// Fill rule for filled paths.
    pub fn fill_rule(&self) -> FillRule {
        self.ctx.caps.fill_rule
    }

    /// Set the fill rule for filled paths.
    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.update_caps(|c| c.fill_rule = rule);
    }

    /// Sampling used for textures and transformed blits.
    pub fn image_interpolation(&self) -> Interpolation {
        self.ctx.caps.interpolation
    }

    /// Set the sampling used for textures and transformed blits.
    pub fn set_image_interpolation(&mut self, interpolation: Interpolation) {
        if self.ctx.caps.interpolation != interpolation {
            self.update_caps(|c| c.interpolation = interpolation);
            self.ctx.pattern = None;
        }
    }

    /// Stroke parameters.
    pub fn stroke(&self) -> &Stroke {
        &self.ctx.caps.stroke
    }

    /// Replace every stroke parameter. Invalid strokes are ignored.
    pub fn set_stroke(&mut self, stroke: Stroke) {
        if valid_width(stroke.width)
            && valid_miter(stroke.miter_limit)
            && valid_dashes(&stroke.dash_pattern)
            && stroke.dash_offset.is_finite()
        {
            self.update_caps(|c| c.stroke = stroke);
        }
    }

    /// Set the stroke width. Negative or non-finite widths are ignored.
    pub fn set_line_width(&mut self, width: f64) {
        if valid_width(width) {
            self.update_caps(|c| c.stroke.width = width);
        }
    }

    /// Set both line caps.
    pub fn set_line_caps(&mut self, cap: Cap) {
        self.update_caps(|c| {
            c.stroke.start_cap = cap;
            c.stroke.end_cap = cap;
        });
    }

    /// Set the line join.
    pub fn set_line_join(&mut self, join: Join) {
        self.update_caps(|c| c.stroke.join = join);
    }

    /// Set the miter limit. Non-finite or negative limits are ignored.
    pub fn set_miter_limit(&mut self, limit: f64) {
        if valid_miter(limit) {
            self.update_caps(|c| c.stroke.miter_limit = limit);
        }
    }

    /// Set the dash pattern; an empty pattern draws solid lines.
    pub fn set_dashes(&mut self, offset: f64, dashes: &[f64]) {
        if offset.is_finite() && valid_dashes(dashes) {
            self.update_caps(|c| {
                c.stroke.dash_offset = offset;
                c.stroke.dash_pattern = dashes.iter().copied().collect();
            });
        }
    }

    // ---------------------------------------------------------------------
    // Transform

    /// User transform, relative to the work origin.
    pub fn transform(&self) -> Affine {
        self.ctx.caps.user_transform
    }

    /// Replace the user transform. Non-finite matrices are ignored.
    pub fn set_transform(&mut self, transform: Affine) {
        if !transform.as_coeffs().iter().all(|v| v.is_finite()) {
            return;
        }
        let origin = self.ctx.clip.work_origin;
        self.update_caps(|c| {
            c.user_transform = transform;
            c.update_transform(origin);
        });
        self.ctx.pattern = None;
    }

    /// Reset the user transform to identity.
    pub fn reset_transform(&mut self) {
        self.set_transform(Affine::IDENTITY);
    }

    /// Combine `m` with the user transform.
    pub fn apply_transform(&mut self, m: Affine, order: MatrixOrder) {
        let current = self.ctx.caps.user_transform;
        let next = match order {
            MatrixOrder::Prepend => current * m,
            MatrixOrder::Append => m * current,
        };
        self.set_transform(next);
    }

    /// Translate the user transform.
    pub fn translate(&mut self, dx: f64, dy: f64, order: MatrixOrder) {
        self.apply_transform(Affine::translate((dx, dy)), order);
    }

    /// Scale the user transform.
    pub fn scale(&mut self, sx: f64, sy: f64, order: MatrixOrder) {
        self.apply_transform(Affine::scale_non_uniform(sx, sy), order);
    }

    /// Rotate the user transform by `angle` radians.
    pub fn rotate(&mut self, angle: f64, order: MatrixOrder) {
        self.apply_transform(Affine::rotate(angle), order);
    }

    /// Skew the user transform.
    pub fn skew(&mut self, kx: f64, ky: f64, order: MatrixOrder) {
        self.apply_transform(Affine::skew(kx, ky), order);
    }

    /// Map a user-space point into layer pixels.
    pub fn world_to_screen(&self, p: Point) -> Point {
        self.ctx.caps.transform * p
    }

    /// Map a layer pixel position back into user space.
    pub fn screen_to_world(&self, p: Point) -> Option<Point> {
        let t = self.ctx.caps.transform;
        let det = t.determinant();
        (det.is_finite() && det != 0.0).then(|| t.inverse() * p)
    }

    // ---------------------------------------------------------------------
    // Drawing

    /// Fill the whole clip area with the source.
    pub fn clear(&mut self) {
        let boxes: Vec<IntBox> = self.ctx.clip.work_region.boxes().to_vec();
        self.paint_device_boxes(&boxes);
    }

    /// Fill an integer box given in user space.
    pub fn fill_box(&mut self, b: IntBox) {
        self.fill_boxes(&[b]);
    }

    /// Fill integer boxes given in user space.
    pub fn fill_boxes(&mut self, boxes: &[IntBox]) {
        if self.ctx.caps.transform_kind == TransformKind::ExactTranslate {
            let t = self.ctx.caps.translation;
            let device: Vec<IntBox> = boxes
                .iter()
                .filter(|b| b.is_valid())
                .map(|b| b.translate(t.x, t.y))
                .collect();
            self.paint_device_boxes(&device);
        } else {
            let rects: Vec<Rect> = boxes
                .iter()
                .filter(|b| b.is_valid())
                .map(|b| b.to_rect())
                .collect();
            self.fill_rects(&rects);
        }
    }

    /// Fill every box of `region` (user space).
    pub fn fill_region(&mut self, region: &Region) {
        self.fill_boxes(region.boxes());
    }

    /// Fill a rectangle.
    pub fn fill_rect(&mut self, r: Rect) {
        self.fill_rects(&[r]);
    }

    /// Fill rectangles.
    pub fn fill_rects(&mut self, rects: &[Rect]) {
        let mut boxes = Vec::with_capacity(rects.len());
        let mut path = BezPath::new();
        for r in rects {
            let r = r.abs();
            if !(r.width() > 0.0 && r.height() > 0.0) {
                continue;
            }
            match self.exact_box(r) {
                Some(b) => boxes.push(b),
                None => {
                    for el in r.path_elements(SHAPE_TOLERANCE) {
                        path.push(el);
                    }
                }
            }
        }
        if !boxes.is_empty() {
            self.paint_device_boxes(&boxes);
        }
        if !path.elements().is_empty() {
            self.paint_path(path, PathMode::Fill(FillRule::NonZero));
        }
    }

    /// Fill a rectangle with rounded corners.
    pub fn fill_round_rect(&mut self, r: Rect, radius: f64) {
        let path = RoundedRect::from_rect(r.abs(), radius.max(0.0)).to_path(SHAPE_TOLERANCE);
        self.fill_path(&path);
    }

    /// Fill an axis-aligned ellipse.
    pub fn fill_ellipse(&mut self, center: Point, radii: Vec2) {
        self.fill_path(&Ellipse::new(center, radii, 0.0).to_path(SHAPE_TOLERANCE));
    }

    /// Fill a pie slice from `start` sweeping `sweep` radians.
    pub fn fill_pie(&mut self, center: Point, radii: Vec2, start: f64, sweep: f64) {
        let arc = kurbo::Arc {
            center,
            radii,
            start_angle: start,
            sweep_angle: sweep,
            x_rotation: 0.0,
        };
        let mut path = BezPath::new();
        path.move_to(center);
        path.line_to(center + Vec2::new(radii.x * start.cos(), radii.y * start.sin()));
        for el in arc.append_iter(SHAPE_TOLERANCE) {
            path.push(el);
        }
        path.close_path();
        self.fill_path(&path);
    }

    /// Fill a closed polygon.
    pub fn fill_polygon(&mut self, points: &[Point]) {
        if let Some(path) = polyline(points, true) {
            self.fill_path(&path);
        }
    }

    /// Fill an arbitrary path with the current fill rule.
    pub fn fill_path(&mut self, path: &BezPath) {
        let rule = self.ctx.caps.fill_rule;
        self.paint_path(path.clone(), PathMode::Fill(rule));
    }

    /// Stroke a line segment.
    pub fn draw_line(&mut self, p0: Point, p1: Point) {
        self.draw_path(&Line::new(p0, p1).to_path(SHAPE_TOLERANCE));
    }

    /// Draw a square dot, one line width across, centered at `p`.
    pub fn draw_point(&mut self, p: Point) {
        let half = self.ctx.caps.stroke.width / 2.0;
        if !(half > 0.0) {
            return;
        }
        self.fill_rect(Rect::new(p.x - half, p.y - half, p.x + half, p.y + half));
    }

    /// Draw a dot centered on the pixel at `p`. With a line width of 1 this
    /// sets exactly that pixel.
    pub fn draw_point_at(&mut self, p: IntPoint) {
        self.draw_point(Point::new(f64::from(p.x) + 0.5, f64::from(p.y) + 0.5));
    }

    /// Stroke an open polyline.
    pub fn draw_polyline(&mut self, points: &[Point]) {
        if let Some(path) = polyline(points, false) {
            self.draw_path(&path);
        }
    }

    /// Stroke a closed polygon.
    pub fn draw_polygon(&mut self, points: &[Point]) {
        if let Some(path) = polyline(points, true) {
            self.draw_path(&path);
        }
    }

    /// Stroke a rectangle outline.
    pub fn draw_rect(&mut self, r: Rect) {
        self.draw_path(&r.abs().to_path(SHAPE_TOLERANCE));
    }

    /// Stroke a rounded rectangle outline.
    pub fn draw_round_rect(&mut self, r: Rect, radius: f64) {
        let path = RoundedRect::from_rect(r.abs(), radius.max(0.0)).to_path(SHAPE_TOLERANCE);
        self.draw_path(&path);
    }

    /// Stroke an ellipse outline.
    pub fn draw_ellipse(&mut self, center: Point, radii: Vec2) {
        self.draw_path(&Ellipse::new(center, radii, 0.0).to_path(SHAPE_TOLERANCE));
    }

    /// Stroke an elliptical arc.
    pub fn draw_arc(&mut self, center: Point, radii: Vec2, start: f64, sweep: f64) {
        let arc = kurbo::Arc {
            center,
            radii,
            start_angle: start,
            sweep_angle: sweep,
            x_rotation: 0.0,
        };
        self.draw_path(&arc.to_path(SHAPE_TOLERANCE));
    }

    /// Stroke an arbitrary path with the current stroke parameters.
    pub fn draw_path(&mut self, path: &BezPath) {
        self.paint_path(path.clone(), PathMode::Stroke);
    }

    /// Draw pre-rendered glyphs with the current source.
    ///
    /// `origin` is transformed and rounded to whole pixels; glyph masks are
    /// never resampled. `clip`, in layer pixels, further restricts the area.
    pub fn draw_glyph_run(&mut self, origin: Point, run: &GlyphRun, clip: Option<IntBox>) {
        if run.is_empty() || !self.prepare_source() {
            return;
        }
        let mut bounds = self.ctx.clip.clip_box;
        if let Some(c) = clip {
            match bounds.intersect(c) {
                Some(b) => bounds = b,
                None => return,
            }
        }
        if !bounds.is_valid() {
            return;
        }

        let at = self.ctx.caps.transform * origin;
        if !(at.x.is_finite() && at.y.is_finite()) {
            return;
        }
        let device_origin = IntPoint::new(at.x.round() as i32, at.y.round() as i32);
        let placements: Vec<(usize, IntPoint)> = run
            .glyphs()
            .iter()
            .enumerate()
            .filter_map(|(i, g)| {
                let gb = glyph_box(g, device_origin);
                gb.intersect(bounds).map(|_| (i, IntPoint::new(gb.x0, gb.y0)))
            })
            .collect();
        if placements.is_empty() {
            return;
        }

        if self.workers.is_none() {
            self.ctx.render_glyphs(run, placements.iter().copied(), bounds);
            return;
        }
        let run = Arc::new(run.clone());
        for chunk in placements.chunks(MAX_GLYPHS_PER_COMMAND) {
            match encode_placements(&self.arena, chunk) {
                Ok(slice) => self.post(
                    CommandKind::GlyphRun {
                        run: Arc::clone(&run),
                        placements: slice,
                        bounds,
                    },
                    None,
                ),
                Err(e) => tracing::warn!(error = %e, "dropping glyph run"),
            }
        }
    }

    /// Draw `image` with its top-left corner at `at` (user space).
    ///
    /// `src` selects a sub-rectangle of the image. The current operator
    /// applies; the current source does not.
    pub fn blit_image(&mut self, at: Point, image: &Image, src: Option<IntBox>) {
        let Some(src) = src.unwrap_or(image.bounds()).intersect(image.bounds()) else {
            return;
        };
        if self.ctx.clip.is_empty() {
            return;
        }
        let caps = &self.ctx.caps;
        let device = caps.transform * at;
        let exact = caps.transform_kind != TransformKind::Affine
            && is_pixel_aligned(device.x)
            && is_pixel_aligned(device.y);
        if exact {
            let origin = IntPoint::new(device.x.round() as i32, device.y.round() as i32);
            self.blit_exact(origin, image, src);
        } else {
            self.blit_transformed(at, image, src);
        }
    }

    /// Draw `image` at an integer user-space position.
    pub fn blit_image_at(&mut self, at: IntPoint, image: &Image, src: Option<IntBox>) {
        self.blit_image(Point::new(f64::from(at.x), f64::from(at.y)), image, src);
    }

    // ---------------------------------------------------------------------
    // Dispatch

    fn exact_box(&self, r: Rect) -> Option<IntBox> {
        let caps = &self.ctx.caps;
        if caps.transform_kind != TransformKind::ExactTranslate {
            return None;
        }
        let aligned = [r.x0, r.y0, r.x1, r.y1].into_iter().all(is_pixel_aligned);
        if !aligned {
            return None;
        }
        let t = caps.translation;
        Some(
            IntBox::new(
                r.x0.round() as i32,
                r.y0.round() as i32,
                r.x1.round() as i32,
                r.y1.round() as i32,
            )
            .translate(t.x, t.y),
        )
    }

    // Build the pattern fetch context when the source needs one. `false`
    // means the draw must be skipped.
    fn prepare_source(&mut self) -> bool {
        let Source::Pattern(pattern) = &self.ctx.caps.source else {
            return true;
        };
        if self.ctx.pattern.is_some() {
            return true;
        }
        let caps = &self.ctx.caps;
        match PatternContext::build(pattern, caps.transform, caps.interpolation) {
            Ok(ctx) => {
                self.ctx.pattern = Some(Arc::new(ctx));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "pattern context unavailable, skipping draw");
                false
            }
        }
    }

    fn post(&mut self, kind: CommandKind, calc: Option<(BezPath, PathMode)>) {
        let Some(workers) = self.workers.as_mut() else {
            return;
        };
        if workers.is_full() {
            tracing::debug!("command queue full, flushing");
            workers.flush();
        }
        let command = Arc::new(Command::new(
            kind,
            &self.ctx,
            workers.worker_count(),
            calc.is_some(),
        ));
        let calc = calc.map(|(path, mode)| Calculation::new(Arc::clone(&command), path, mode));
        workers.post(command, calc);
    }

    // Boxes in layer pixels; clipped here.
    fn paint_device_boxes(&mut self, boxes: &[IntBox]) {
        if self.ctx.clip.is_empty() || !self.prepare_source() {
            return;
        }
        let clip = &self.ctx.clip;
        let clipped: Vec<IntBox> = if clip.clip_simple {
            boxes
                .iter()
                .filter_map(|b| b.intersect(clip.clip_box))
                .collect()
        } else {
            boxes
                .iter()
                .flat_map(|b| {
                    Region::from_box(*b)
                        .intersect(&clip.work_region)
                        .boxes()
                        .to_vec()
                })
                .collect()
        };
        if clipped.is_empty() {
            return;
        }

        if self.workers.is_none() {
            self.ctx.render_boxes(clipped);
            return;
        }
        for chunk in clipped.chunks(MAX_BOXES_PER_COMMAND) {
            match encode_boxes(&self.arena, chunk) {
                Ok(slice) => self.post(CommandKind::Boxes(slice), None),
                Err(e) => tracing::warn!(error = %e, "dropping box command"),
            }
        }
    }

    fn paint_path(&mut self, path: BezPath, mode: PathMode) {
        if self.ctx.clip.is_empty() || path.elements().is_empty() {
            return;
        }
        if mode == PathMode::Stroke && self.ctx.caps.stroke.width <= 0.0 {
            return;
        }
        if !self.prepare_source() {
            return;
        }
        if self.workers.is_none() {
            if let Some(ras) = self.ctx.rasterize(&path, mode, &self.raster_pool) {
                self.ctx.render_path(&ras);
            }
            return;
        }
        self.post(CommandKind::Path(Default::default()), Some((path, mode)));
    }

    fn blit_exact(&mut self, origin: IntPoint, image: &Image, src: IntBox) {
        let placed = IntBox::from_xywh(origin.x, origin.y, src.width(), src.height());
        let Some(dst) = placed.intersect(self.ctx.clip.clip_box) else {
            return;
        };
        let src_origin = IntPoint::new(
            src.x0 + (dst.x0 - placed.x0),
            src.y0 + (dst.y0 - placed.y0),
        );
        if self.workers.is_none() {
            self.ctx.render_image(dst, src_origin, image);
            return;
        }
        self.post(
            CommandKind::Image {
                dst,
                src: src_origin,
                image: image.clone(),
            },
            None,
        );
    }

    fn blit_transformed(&mut self, at: Point, image: &Image, src: IntBox) {
        let offset = Vec2::new(
            at.x - f64::from(src.x0),
            at.y - f64::from(src.y0),
        );
        let pattern = Pattern::texture(image.clone())
            .with_spread(Spread::Pad)
            .with_transform(Affine::translate(offset));
        let caps = &self.ctx.caps;
        let texture = match PatternContext::build(&pattern, caps.transform, caps.interpolation) {
            Ok(t) => Arc::new(t),
            Err(e) => {
                tracing::warn!(error = %e, "image transform not invertible, skipping blit");
                return;
            }
        };
        let quad = Rect::new(
            at.x,
            at.y,
            at.x + f64::from(src.width()),
            at.y + f64::from(src.height()),
        )
        .to_path(SHAPE_TOLERANCE);
        let mode = PathMode::Fill(FillRule::NonZero);

        if self.workers.is_none() {
            if let Some(ras) = self.ctx.rasterize(&quad, mode, &self.raster_pool) {
                self.ctx.render_texture(&ras, &texture);
            }
            return;
        }
        self.post(
            CommandKind::AffineImage {
                raster: Default::default(),
                texture,
            },
            Some((quad, mode)),
        );
    }
}

fn valid_width(w: f64) -> bool {
    w.is_finite() && w >= 0.0
}

fn valid_miter(limit: f64) -> bool {
    limit.is_finite() && limit >= 0.0
}

fn valid_dashes(dashes: &[f64]) -> bool {
    dashes.iter().all(|d| d.is_finite() && *d >= 0.0)
        && (dashes.is_empty() || dashes.iter().sum::<f64>() > 0.0)
}

fn polyline(points: &[Point], close: bool) -> Option<BezPath> {
    let (first, rest) = points.split_first()?;
    let mut path = BezPath::new();
    path.move_to(*first);
    for p in rest {
        path.line_to(*p);
    }
    if close {
        path.close_path();
    }
    Some(path)
}

#[cfg(test)]
#[path = "../../tests/unit/engine/painter.rs"]
mod tests;
