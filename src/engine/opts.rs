use crate::foundation::error::{PaintError, PaintResult};
use crate::memory::arena::DEFAULT_BLOCK_WORDS;

/// Fewest workers worth running in multithreaded mode.
pub const MIN_WORKERS: usize = 2;
/// Most workers a single engine will use.
pub const MAX_WORKERS: usize = 16;

// One block must hold the largest box or glyph command payload.
const MIN_ARENA_BLOCK_WORDS: usize = 512;

/// Threading mode of a [`PaintEngine`](crate::PaintEngine).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    /// Multithreaded when the target reaches `auto_threshold_pixels`.
    #[default]
    Auto,
    /// Render immediately on the calling thread.
    SingleThreaded,
    /// Queue work for row-partitioned worker threads.
    MultiThreaded,
}

impl EngineMode {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "st" | "single" | "single_threaded" => Some(Self::SingleThreaded),
            "mt" | "multi" | "multi_threaded" => Some(Self::MultiThreaded),
            _ => None,
        }
    }
}

/// Options used when a paint engine is created.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineOpts {
    /// Initial threading mode.
    pub mode: EngineMode,
    /// Requested worker count. `None` uses the available parallelism.
    pub threads: Option<usize>,
    /// Commands (and calculations) queued before a flush is forced.
    pub queue_capacity: usize,
    /// Size of one arena block in 32-bit words.
    pub arena_block_words: usize,
    /// Wake a sleeping worker every this many posted commands.
    pub wake_interval: usize,
    /// Empty scheduling passes a worker makes before it sleeps.
    pub idle_retries: u32,
    /// Target area from which `Auto` picks multithreaded mode.
    pub auto_threshold_pixels: u64,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            mode: EngineMode::Auto,
            threads: None,
            queue_capacity: 1024,
            arena_block_words: DEFAULT_BLOCK_WORDS,
            wake_interval: 16,
            idle_retries: 2,
            auto_threshold_pixels: 256 * 256,
        }
    }
}

impl EngineOpts {
    /// Parse options from JSON. Missing fields keep their defaults.
    pub fn from_json(s: &str) -> PaintResult<Self> {
        let opts: Self = serde_json::from_str(s)
            .map_err(|e| PaintError::invalid_argument(format!("engine options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Defaults with `BRUSHFIRE_ENGINE`, `BRUSHFIRE_THREADS` and
    /// `BRUSHFIRE_QUEUE_CAPACITY` applied. Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Some(mode) = std::env::var("BRUSHFIRE_ENGINE")
            .ok()
            .and_then(|v| EngineMode::parse(&v))
        {
            opts.mode = mode;
        }
        opts.threads = std::env::var("BRUSHFIRE_THREADS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .or(opts.threads);
        opts.queue_capacity = std::env::var("BRUSHFIRE_QUEUE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(opts.queue_capacity);
        opts
    }

    /// Reject options the engine cannot run with.
    pub fn validate(&self) -> PaintResult<()> {
        if self.queue_capacity == 0 {
            return Err(PaintError::invalid_argument("queue_capacity must be > 0"));
        }
        if self.arena_block_words < MIN_ARENA_BLOCK_WORDS {
            return Err(PaintError::invalid_argument(format!(
                "arena_block_words must be >= {MIN_ARENA_BLOCK_WORDS}, got {}",
                self.arena_block_words
            )));
        }
        if self.wake_interval == 0 {
            return Err(PaintError::invalid_argument("wake_interval must be > 0"));
        }
        if self.threads == Some(0) {
            return Err(PaintError::invalid_argument("threads must be > 0"));
        }
        Ok(())
    }

    /// Replace the threading mode.
    pub fn with_mode(mut self, mode: EngineMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the requested worker count.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Replace the queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Replace the arena block size.
    pub fn with_arena_block_words(mut self, words: usize) -> Self {
        self.arena_block_words = words;
        self
    }

    /// Replace the worker wake interval.
    pub fn with_wake_interval(mut self, interval: usize) -> Self {
        self.wake_interval = interval;
        self
    }

    /// Replace the number of empty passes a worker makes before sleeping.
    pub fn with_idle_retries(mut self, retries: u32) -> Self {
        self.idle_retries = retries;
        self
    }

    /// Replace the target area from which `Auto` picks multithreaded mode.
    pub fn with_auto_threshold_pixels(mut self, pixels: u64) -> Self {
        self.auto_threshold_pixels = pixels;
        self
    }

    /// Worker count to request for multithreaded mode.
    pub(crate) fn resolved_threads(&self) -> usize {
        let n = self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(MIN_WORKERS, |n| n.get())
        });
        clamp_workers(n)
    }
}

pub(crate) fn clamp_workers(n: usize) -> usize {
    n.clamp(MIN_WORKERS, MAX_WORKERS)
}

#[cfg(test)]
#[path = "../../tests/unit/engine/opts.rs"]
mod tests;
