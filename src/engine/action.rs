//! Deferred work posted to the workers.
//!
//! A [`Command`] is executed by every worker over its own rows. A
//! [`Calculation`] produces a command's missing input and runs exactly once,
//! on whichever worker claims it first.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use crate::foundation::core::{BezPath, IntBox, IntPoint};
use crate::foundation::error::PaintResult;
use crate::memory::arena::{Arena, ArenaSlice};
use crate::pattern::context::PatternContext;
use crate::raster::pool::{PooledRasterizer, RasterizerPool};
use crate::render::context::{PathMode, RenderContext};
use crate::state::caps::CapsState;
use crate::state::clip::ClipState;
use crate::surface::image::Image;
use crate::text::glyph::GlyphRun;

/// Most boxes carried by one box command.
pub(crate) const MAX_BOXES_PER_COMMAND: usize = 128;
/// Most glyphs carried by one glyph command.
pub(crate) const MAX_GLYPHS_PER_COMMAND: usize = 128;

const BOX_WORDS: usize = 4;
const GLYPH_WORDS: usize = 3;

/// Lifecycle of a command. Moves out of `Wait` once, never back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum CommandStatus {
    Wait = 0,
    Ready = 1,
    Skip = 2,
}

impl CommandStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => CommandStatus::Wait,
            1 => CommandStatus::Ready,
            _ => CommandStatus::Skip,
        }
    }
}

pub(crate) enum CommandKind {
    /// Integer boxes inside the clip, four arena words each.
    Boxes(ArenaSlice),
    /// Exact-translate blit of `image` starting at pixel `src` onto `dst`.
    Image {
        dst: IntBox,
        src: IntPoint,
        image: Image,
    },
    Path(OnceLock<PooledRasterizer>),
    /// Transformed blit: the rasterized quad filled from `texture`.
    AffineImage {
        raster: OnceLock<PooledRasterizer>,
        texture: Arc<PatternContext>,
    },
    /// Glyph index and device top-left, three arena words per glyph.
    GlyphRun {
        run: Arc<GlyphRun>,
        placements: ArenaSlice,
        bounds: IntBox,
    },
}

pub(crate) struct Command {
    kind: CommandKind,
    clip: Arc<ClipState>,
    caps: Arc<CapsState>,
    pattern: Option<Arc<PatternContext>>,
    // Workers that still have to pass this command.
    remaining: AtomicUsize,
    status: AtomicU8,
}

impl Command {
    pub(crate) fn new(
        kind: CommandKind,
        ctx: &RenderContext,
        workers: usize,
        has_calculation: bool,
    ) -> Self {
        let status = if has_calculation {
            CommandStatus::Wait
        } else {
            CommandStatus::Ready
        };
        Self {
            kind,
            clip: Arc::clone(&ctx.clip),
            caps: Arc::clone(&ctx.caps),
            pattern: ctx.pattern.clone(),
            remaining: AtomicUsize::new(workers),
            status: AtomicU8::new(status as u8),
        }
    }

    pub(crate) fn status(&self) -> CommandStatus {
        CommandStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Publish the rasterized input and leave `Wait`.
    fn complete(&self, raster: Option<PooledRasterizer>) {
        let slot = match &self.kind {
            CommandKind::Path(slot) | CommandKind::AffineImage { raster: slot, .. } => slot,
            _ => {
                self.status.store(CommandStatus::Ready as u8, Ordering::Release);
                return;
            }
        };
        let status = match raster {
            Some(r) => {
                if slot.set(r).is_ok() {
                    CommandStatus::Ready
                } else {
                    CommandStatus::Skip
                }
            }
            None => CommandStatus::Skip,
        };
        self.status.store(status as u8, Ordering::Release);
    }

    /// Render this command's rows owned by `ctx`.
    pub(crate) fn run(&self, ctx: &mut RenderContext) {
        ctx.bind(&self.clip, &self.caps, self.pattern.as_ref());
        match &self.kind {
            CommandKind::Boxes(boxes) => ctx.render_boxes(decode_boxes(boxes)),
            CommandKind::Image { dst, src, image } => ctx.render_image(*dst, *src, image),
            CommandKind::Path(raster) => {
                if let Some(ras) = raster.get() {
                    ctx.render_path(ras);
                }
            }
            CommandKind::AffineImage { raster, texture } => {
                if let Some(ras) = raster.get() {
                    ctx.render_texture(ras, texture);
                }
            }
            CommandKind::GlyphRun {
                run,
                placements,
                bounds,
            } => ctx.render_glyphs(run, decode_placements(placements), *bounds),
        }
    }

    /// Record that one worker is done. Returns `true` for the last one.
    pub(crate) fn finish(&self) -> bool {
        self.remaining.fetch_sub(1, Ordering::AcqRel) == 1
    }
}

/// Path rasterization feeding a `Path` or `AffineImage` command.
pub(crate) struct Calculation {
    command: Arc<Command>,
    path: BezPath,
    mode: PathMode,
}

impl Calculation {
    pub(crate) fn new(command: Arc<Command>, path: BezPath, mode: PathMode) -> Self {
        Self {
            command,
            path,
            mode,
        }
    }

    /// Rasterize against the command's state, then mark it ready or skipped.
    pub(crate) fn run(self, ctx: &mut RenderContext, pool: &Arc<RasterizerPool>) {
        let cmd = &self.command;
        ctx.bind(&cmd.clip, &cmd.caps, cmd.pattern.as_ref());
        let raster = ctx.rasterize(&self.path, self.mode, pool);
        cmd.complete(raster);
    }
}

pub(crate) fn encode_boxes(arena: &Arena, boxes: &[IntBox]) -> PaintResult<ArenaSlice> {
    let slice = arena.alloc(boxes.len() * BOX_WORDS)?;
    for (i, b) in boxes.iter().enumerate() {
        let at = i * BOX_WORDS;
        slice.set(at, b.x0 as u32);
        slice.set(at + 1, b.y0 as u32);
        slice.set(at + 2, b.x1 as u32);
        slice.set(at + 3, b.y1 as u32);
    }
    Ok(slice)
}

fn decode_boxes(slice: &ArenaSlice) -> impl Iterator<Item = IntBox> + '_ {
    (0..slice.len() / BOX_WORDS).map(move |i| {
        let at = i * BOX_WORDS;
        IntBox::new(
            slice.get(at) as i32,
            slice.get(at + 1) as i32,
            slice.get(at + 2) as i32,
            slice.get(at + 3) as i32,
        )
    })
}

pub(crate) fn encode_placements(
    arena: &Arena,
    placements: &[(usize, IntPoint)],
) -> PaintResult<ArenaSlice> {
    let slice = arena.alloc(placements.len() * GLYPH_WORDS)?;
    for (i, (index, at)) in placements.iter().enumerate() {
        let w = i * GLYPH_WORDS;
        slice.set(w, *index as u32);
        slice.set(w + 1, at.x as u32);
        slice.set(w + 2, at.y as u32);
    }
    Ok(slice)
}

fn decode_placements(slice: &ArenaSlice) -> impl Iterator<Item = (usize, IntPoint)> + '_ {
    (0..slice.len() / GLYPH_WORDS).map(move |i| {
        let w = i * GLYPH_WORDS;
        (
            slice.get(w) as usize,
            IntPoint::new(slice.get(w + 1) as i32, slice.get(w + 2) as i32),
        )
    })
}

#[cfg(test)]
#[path = "../../tests/unit/engine/action.rs"]
mod tests;
