//! Brushfire is a software 2D raster paint engine.
//!
//! A [`PaintEngine`] draws into an [`Image`] either directly on the calling
//! thread or through a pool of worker threads that each own an interleaved
//! set of rows. Both modes produce bit-identical pixels:
//!
//! - Configure a target with [`PaintEngine::begin`] and [`EngineOpts`]
//! - Set clip, compositing and stroke state, optionally with `save`/`restore`
//! - Fill and stroke shapes, blit images and draw glyph runs
//! - Call [`PaintEngine::flush`] or [`PaintEngine::end`] to wait for queued work
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod composite;
pub(crate) mod engine;
pub(crate) mod geometry;
pub(crate) mod memory;
pub(crate) mod pattern;
pub(crate) mod raster;
pub(crate) mod render;
pub(crate) mod state;
pub(crate) mod surface;
pub(crate) mod text;

pub use kurbo::{Cap, Join, Stroke};

pub use crate::foundation::core::{Affine, Argb, BezPath, IntBox, IntPoint, Point, Rect, Vec2};
pub use crate::foundation::error::{PaintError, PaintResult};

pub use crate::composite::operator::Operator;
pub use crate::engine::opts::{EngineMode, EngineOpts, MAX_WORKERS, MIN_WORKERS};
pub use crate::engine::painter::{MatrixOrder, PaintEngine};
pub use crate::engine::stats::PaintStats;
pub use crate::engine::thread_pool::{ThreadLease, WorkerThreadPool};
pub use crate::geometry::region::Region;
pub use crate::pattern::filter::ColorFilter;
pub use crate::pattern::{GradientStop, Interpolation, Pattern, PatternKind, Spread};
pub use crate::raster::path::FlatPath;
pub use crate::raster::rasterizer::{FillRule, Rasterizer};
pub use crate::raster::scanline::{Scanline, Span, SpanCoverage};
pub use crate::state::caps::{SolidColor, Source};
pub use crate::surface::format::PixelFormat;
pub use crate::surface::image::{Image, MAX_IMAGE_DIMENSION};
pub use crate::text::glyph::{GlyphBitmap, GlyphRun, PlacedGlyph};
