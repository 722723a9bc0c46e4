//! Process-wide pool of long-lived worker threads.
//!
//! The pool wraps a rayon thread pool whose threads are named
//! `brushfire-worker-N`. Engines lease a share of those threads while they run
//! multithreaded and hand the lease back when they leave that mode. A worker
//! task blocks its thread for the whole lease, so the lease budget never
//! exceeds the number of threads rayon was built with.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::engine::opts::MAX_WORKERS;
use crate::foundation::error::{PaintError, PaintResult};

/// Threads leased to one engine.
#[derive(Debug, Default)]
#[must_use = "a lease must be handed back with `WorkerThreadPool::release`"]
pub struct ThreadLease {
    threads: usize,
}

impl ThreadLease {
    /// Number of leased threads.
    pub fn len(&self) -> usize {
        self.threads
    }

    /// Return `true` when nothing was leased.
    pub fn is_empty(&self) -> bool {
        self.threads == 0
    }
}

fn build_thread_pool(threads: usize) -> PaintResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(PaintError::invalid_argument(
            "worker pool needs at least one thread",
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("brushfire-worker-{i}"))
        .build()
        .map_err(|e| PaintError::Other(anyhow::Error::new(e).context("build worker pool")))
}

/// Pool of named OS threads shared by paint engines.
#[derive(Debug)]
pub struct WorkerThreadPool {
    max_threads: usize,
    threads: OnceLock<rayon::ThreadPool>,
    leased: AtomicUsize,
}

impl WorkerThreadPool {
    /// Pool that never runs more than `max_threads` threads. Threads are
    /// started on the first lease.
    pub fn new(max_threads: usize) -> Self {
        Self {
            max_threads,
            threads: OnceLock::new(),
            leased: AtomicUsize::new(0),
        }
    }

    /// Pool shared by every engine that does not bring its own.
    pub fn global() -> &'static WorkerThreadPool {
        static GLOBAL: OnceLock<WorkerThreadPool> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
            WorkerThreadPool::new(cores.max(MAX_WORKERS))
        })
    }

    /// Largest number of threads the pool runs.
    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// Threads currently leased out.
    pub fn leased(&self) -> usize {
        self.leased.load(Ordering::Relaxed)
    }

    /// Lease up to `n` threads. Fewer are granted when other engines hold the
    /// rest, and none when the pool cannot be started.
    pub fn acquire(&self, n: usize) -> ThreadLease {
        if n == 0 {
            return ThreadLease::default();
        }
        if let Err(e) = self.threads() {
            tracing::warn!(error = %e, "worker pool unavailable");
            return ThreadLease::default();
        }
        let granted = self
            .leased
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |leased| {
                let free = self.max_threads.saturating_sub(leased);
                (free > 0).then(|| leased + free.min(n))
            })
            .map_or(0, |before| (self.max_threads - before).min(n));
        ThreadLease { threads: granted }
    }

    /// Return a lease to the pool.
    pub fn release(&self, lease: ThreadLease) {
        self.leased.fetch_sub(lease.threads, Ordering::AcqRel);
    }

    /// Run `job` on one of the leased threads.
    pub(crate) fn spawn(
        &self,
        lease: &ThreadLease,
        job: impl FnOnce() + Send + 'static,
    ) -> PaintResult<()> {
        if lease.is_empty() {
            return Err(PaintError::invalid_argument("spawn without a thread lease"));
        }
        self.threads()?.spawn(job);
        Ok(())
    }

    fn threads(&self) -> PaintResult<&rayon::ThreadPool> {
        if let Some(pool) = self.threads.get() {
            return Ok(pool);
        }
        let built = build_thread_pool(self.max_threads)?;
        // A racing builder may win; its pool is kept and ours is dropped.
        Ok(self.threads.get_or_init(|| built))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/thread_pool.rs"]
mod tests;
