use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing the work an engine has done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaintStats {
    /// Commands queued for workers.
    pub commands_posted: u64,
    /// Queued commands whose last worker has finished with them.
    pub commands_released: u64,
    /// Calculations queued for workers.
    pub calculations_posted: u64,
    /// Calculations executed by a worker.
    pub calculations_run: u64,
    /// Flushes that waited for queued work.
    pub flushes: u64,
    /// Rasterizers allocated because the pool had none to lend.
    pub rasterizers_created: u64,
    /// Rasterizer borrows served from the pool.
    pub rasterizers_reused: u64,
    /// Rasterizers dropped on release because the pool was full.
    pub rasterizers_dropped: u64,
    /// Idle rasterizers currently held by the pool.
    pub rasterizers_retained: usize,
    /// Arena blocks requested from the system.
    pub arena_blocks_allocated: u64,
    /// Arena blocks recycled after all their allocations were freed.
    pub arena_blocks_reused: u64,
    /// Arena blocks currently owned by the engine.
    pub arena_live_blocks: usize,
}

/// Shared counters updated by the producer and the workers.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    commands_posted: AtomicU64,
    commands_released: AtomicU64,
    calculations_posted: AtomicU64,
    calculations_run: AtomicU64,
    flushes: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn command_posted(&self) {
        self.commands_posted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn command_released(&self) {
        self.commands_released.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn calculation_posted(&self) {
        self.calculations_posted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn calculation_run(&self) {
        self.calculations_run.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn flushed(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PaintStats {
        PaintStats {
            commands_posted: self.commands_posted.load(Ordering::Relaxed),
            commands_released: self.commands_released.load(Ordering::Relaxed),
            calculations_posted: self.calculations_posted.load(Ordering::Relaxed),
            calculations_run: self.calculations_run.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            ..PaintStats::default()
        }
    }
}
