use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::raster::rasterizer::Rasterizer;

/// Pool configuration for recycled rasterizers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RasterizerPoolOpts {
    /// Maximum number of idle rasterizers kept for reuse.
    pub(crate) max_retained: usize,
}

impl Default for RasterizerPoolOpts {
    fn default() -> Self {
        Self { max_retained: 32 }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RasterizerPoolStats {
    pub(crate) retained: usize,
    pub(crate) created: u64,
    pub(crate) reused: u64,
    pub(crate) dropped_on_release: u64,
}

struct PoolInner {
    free: Vec<Rasterizer>,
    stats: RasterizerPoolStats,
}

/// Bounded pool of rasterizers shared by path calculations.
///
/// Borrow/release happens once per path, never per row.
pub(crate) struct RasterizerPool {
    opts: RasterizerPoolOpts,
    inner: Mutex<PoolInner>,
}

impl RasterizerPool {
    pub(crate) fn new(opts: RasterizerPoolOpts) -> Self {
        Self {
            opts,
            inner: Mutex::new(PoolInner {
                free: Vec::new(),
                stats: RasterizerPoolStats::default(),
            }),
        }
    }

    pub(crate) fn stats(&self) -> RasterizerPoolStats {
        self.inner.lock().stats
    }

    pub(crate) fn borrow(&self) -> Rasterizer {
        let mut inner = self.inner.lock();
        if let Some(mut ras) = inner.free.pop() {
            inner.stats.retained = inner.stats.retained.saturating_sub(1);
            inner.stats.reused = inner.stats.reused.saturating_add(1);
            ras.reset();
            return ras;
        }
        inner.stats.created = inner.stats.created.saturating_add(1);
        Rasterizer::new()
    }

    pub(crate) fn release(&self, ras: Rasterizer) {
        let mut inner = self.inner.lock();
        if inner.free.len() >= self.opts.max_retained {
            inner.stats.dropped_on_release = inner.stats.dropped_on_release.saturating_add(1);
            return;
        }
        inner.free.push(ras);
        inner.stats.retained = inner.stats.retained.saturating_add(1);
    }
}

/// Finalized rasterizer that returns to its pool when dropped.
pub(crate) struct PooledRasterizer {
    ras: Rasterizer,
    pool: Arc<RasterizerPool>,
}

impl PooledRasterizer {
    pub(crate) fn new(ras: Rasterizer, pool: Arc<RasterizerPool>) -> Self {
        Self { ras, pool }
    }
}

impl Deref for PooledRasterizer {
    type Target = Rasterizer;

    fn deref(&self) -> &Rasterizer {
        &self.ras
    }
}

impl Drop for PooledRasterizer {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.ras));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/pool.rs"]
mod tests;
