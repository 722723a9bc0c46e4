//! Worker tasks and the scheduling protocol that drives them.
//!
//! Every task walks the shared queues with private cursors. Calculations are
//! claimed by exactly one task; commands are executed by every task over its
//! own rows. Tasks that cannot progress sleep on their own condition variable
//! and are woken under the scheduler lock, so a wake-up is never lost.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::engine::action::{Calculation, Command, CommandStatus};
use crate::engine::opts::MIN_WORKERS;
use crate::engine::queue::ActionQueue;
use crate::engine::stats::StatsCounters;
use crate::engine::thread_pool::{ThreadLease, WorkerThreadPool};
use crate::raster::pool::RasterizerPool;
use crate::render::context::RenderContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
enum TaskState {
    Running = 0,
    Waiting = 1,
    Done = 2,
}

struct TaskSlot {
    // Written only under the scheduler lock.
    state: AtomicU8,
    wake: Condvar,
    cmd_cursor: AtomicUsize,
    calc_cursor: AtomicUsize,
}

impl TaskSlot {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(TaskState::Running as u8),
            wake: Condvar::new(),
            cmd_cursor: AtomicUsize::new(0),
            calc_cursor: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> TaskState {
        match self.state.load(Ordering::Acquire) {
            0 => TaskState::Running,
            1 => TaskState::Waiting,
            _ => TaskState::Done,
        }
    }

    fn set_state(&self, _guard: &Schedule, state: TaskState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Bookkeeping guarded by the scheduler lock.
struct Schedule {
    waiting: usize,
    released: usize,
}

/// One-way cancellation broadcast to every task.
#[derive(Default)]
struct ShutdownSignal(AtomicBool);

impl ShutdownSignal {
    fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// State shared by the producer and all tasks of one engine.
pub(crate) struct WorkerShared {
    pub(crate) queue: ActionQueue,
    schedule: Mutex<Schedule>,
    all_finished: Condvar,
    released: Condvar,
    tasks: Box<[TaskSlot]>,
    shutdown: ShutdownSignal,
    pool: Arc<RasterizerPool>,
    stats: Arc<StatsCounters>,
    idle_retries: u32,
}

impl WorkerShared {
    fn new(
        workers: usize,
        queue_capacity: usize,
        idle_retries: u32,
        pool: Arc<RasterizerPool>,
        stats: Arc<StatsCounters>,
    ) -> Self {
        Self {
            queue: ActionQueue::new(queue_capacity),
            schedule: Mutex::new(Schedule {
                waiting: 0,
                released: 0,
            }),
            all_finished: Condvar::new(),
            released: Condvar::new(),
            tasks: (0..workers).map(|_| TaskSlot::new()).collect(),
            shutdown: ShutdownSignal::default(),
            pool,
            stats,
            idle_retries,
        }
    }

    fn workers(&self) -> usize {
        self.tasks.len()
    }

    /// Return `true` when task `id` has something it can do right now.
    fn can_progress(&self, id: usize) -> bool {
        let task = &self.tasks[id];
        if task.calc_cursor.load(Ordering::Acquire) < self.queue.calc_len() {
            return true;
        }
        let cur = task.cmd_cursor.load(Ordering::Acquire);
        cur < self.queue.command_len()
            && self
                .queue
                .command(cur)
                .is_some_and(|c| c.status() != CommandStatus::Wait)
    }

    /// Every task has passed every queued command.
    fn is_completed(&self) -> bool {
        let len = self.queue.command_len();
        self.tasks
            .iter()
            .all(|t| t.cmd_cursor.load(Ordering::Acquire) == len)
    }

    fn is_drained(&self, id: usize) -> bool {
        let task = &self.tasks[id];
        task.cmd_cursor.load(Ordering::Acquire) >= self.queue.command_len()
            && task.calc_cursor.load(Ordering::Acquire) >= self.queue.calc_len()
    }

    fn wake(&self, guard: &mut Schedule, id: usize) {
        self.tasks[id].set_state(guard, TaskState::Running);
        guard.waiting -= 1;
        self.tasks[id].wake.notify_one();
    }

    /// Wake one sleeping task that can make progress, skipping `called_from`.
    fn wake_up_scheduled(&self, guard: &mut Schedule, called_from: Option<usize>) -> bool {
        let found = (0..self.workers()).find(|&i| {
            Some(i) != called_from
                && self.tasks[i].state() == TaskState::Waiting
                && self.can_progress(i)
        });
        if let Some(i) = found {
            self.wake(guard, i);
        }
        found.is_some()
    }

    /// Wake one sleeping task regardless of pending work.
    fn wake_up_sleeping(&self, guard: &mut Schedule) -> bool {
        let found = (0..self.workers()).find(|&i| self.tasks[i].state() == TaskState::Waiting);
        if let Some(i) = found {
            self.wake(guard, i);
        }
        found.is_some()
    }

    fn wake_all(&self, guard: &mut Schedule) {
        while self.wake_up_sleeping(guard) {}
    }

    fn run_calculations(&self, ctx: &mut RenderContext, id: usize) -> bool {
        let task = &self.tasks[id];
        let len = self.queue.calc_len();
        let mut cur = task.calc_cursor.load(Ordering::Relaxed);
        let progressed = cur < len;
        while cur < len {
            if let Some(calc) = self.queue.claim_calc(cur) {
                tracing::trace!(worker = id, index = cur, "claimed calculation");
                calc.run(ctx, &self.pool);
                self.stats.calculation_run();
                let mut guard = self.schedule.lock();
                self.wake_up_scheduled(&mut guard, Some(id));
            }
            cur += 1;
            task.calc_cursor.store(cur, Ordering::Release);
        }
        progressed
    }

    fn run_commands(&self, ctx: &mut RenderContext, id: usize) -> bool {
        let task = &self.tasks[id];
        let len = self.queue.command_len();
        let start = task.cmd_cursor.load(Ordering::Relaxed);
        let mut cur = start;
        while cur < len {
            if let Some(cmd) = self.queue.command(cur) {
                match cmd.status() {
                    CommandStatus::Wait => break,
                    CommandStatus::Ready => cmd.run(ctx),
                    CommandStatus::Skip => {}
                }
                let last = cmd.finish();
                drop(cmd);
                if last {
                    self.queue.release_command(cur);
                    self.stats.command_released();
                }
            }
            cur += 1;
            task.cmd_cursor.store(cur, Ordering::Release);
        }
        cur != start
    }

    /// Put task `id` to sleep until it is woken. Returns `false` when the
    /// task must exit.
    fn idle(&self, id: usize) -> bool {
        let mut guard = self.schedule.lock();
        loop {
            if self.shutdown.is_raised() && self.is_drained(id) {
                self.tasks[id].set_state(&guard, TaskState::Done);
                self.wake_up_sleeping(&mut guard);
                guard.released += 1;
                self.released.notify_all();
                return false;
            }
            if self.can_progress(id) {
                return true;
            }

            self.tasks[id].set_state(&guard, TaskState::Waiting);
            guard.waiting += 1;
            if guard.waiting == self.workers() {
                if self.is_completed() {
                    self.all_finished.notify_all();
                } else {
                    self.wake_up_scheduled(&mut guard, Some(id));
                }
            }
            while self.tasks[id].state() == TaskState::Waiting {
                self.tasks[id].wake.wait(&mut guard);
            }
        }
    }

    #[tracing::instrument(skip_all, fields(worker = id))]
    fn run_task(&self, id: usize, mut ctx: RenderContext) {
        tracing::debug!("worker started");
        loop {
            let mut passes = 0;
            while passes <= self.idle_retries {
                let calcs = self.run_calculations(&mut ctx, id);
                let commands = self.run_commands(&mut ctx, id);
                if calcs || commands {
                    passes = 0;
                } else {
                    passes += 1;
                    std::thread::yield_now();
                }
            }
            if !self.idle(id) {
                break;
            }
        }
        tracing::debug!("worker done");
    }
}

/// Worker tasks of one engine running on leased pool threads.
pub(crate) struct WorkerManager {
    shared: Arc<WorkerShared>,
    lease: ThreadLease,
    pool: &'static WorkerThreadPool,
    wake_interval: usize,
    posted: usize,
}

/// Settings needed to start a [`WorkerManager`].
pub(crate) struct WorkerConfig {
    pub(crate) threads: usize,
    pub(crate) queue_capacity: usize,
    pub(crate) idle_retries: u32,
    pub(crate) wake_interval: usize,
}

impl WorkerManager {
    /// Lease threads and start one task per thread.
    ///
    /// Returns `None` when fewer than two threads are available.
    pub(crate) fn start(
        pool: &'static WorkerThreadPool,
        config: WorkerConfig,
        template: &RenderContext,
        raster_pool: Arc<RasterizerPool>,
        stats: Arc<StatsCounters>,
    ) -> Option<Self> {
        let lease = pool.acquire(config.threads);
        if lease.len() < MIN_WORKERS {
            tracing::warn!(
                requested = config.threads,
                granted = lease.len(),
                "not enough worker threads, staying single-threaded"
            );
            pool.release(lease);
            return None;
        }

        let n = lease.len();
        let shared = Arc::new(WorkerShared::new(
            n,
            config.queue_capacity,
            config.idle_retries,
            raster_pool,
            stats,
        ));
        for id in 0..n {
            let task_shared = Arc::clone(&shared);
            let ctx = RenderContext::worker(id, n, template);
            let started = pool.spawn(&lease, move || task_shared.run_task(id, ctx));
            if let Err(e) = started {
                tracing::warn!(error = %e, "worker task failed to start");
                // Tasks that never started count as already released.
                let mut guard = shared.schedule.lock();
                for slot in &shared.tasks[id..] {
                    slot.set_state(&guard, TaskState::Done);
                }
                guard.released += n - id;
                drop(guard);
                let mut mgr = Self {
                    shared,
                    lease,
                    pool,
                    wake_interval: config.wake_interval,
                    posted: 0,
                };
                mgr.shutdown();
                return None;
            }
        }

        tracing::debug!(workers = n, "worker tasks started");
        Some(Self {
            shared,
            lease,
            pool,
            wake_interval: config.wake_interval.max(1),
            posted: 0,
        })
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.shared.workers()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.shared.queue.is_full()
    }

    /// Queue a command and its calculation. The queue must not be full.
    pub(crate) fn post(&mut self, command: Arc<Command>, calc: Option<Calculation>) {
        if calc.is_some() {
            self.shared.stats.calculation_posted();
        }
        self.shared.stats.command_posted();
        self.shared.queue.push(command, calc);
        tracing::trace!(len = self.shared.queue.command_len(), "posted command");

        self.posted += 1;
        if self.posted % self.wake_interval == 0 {
            let mut guard = self.shared.schedule.lock();
            self.shared.wake_up_scheduled(&mut guard, None);
        }
    }

    /// Block until every queued action is done, then empty the queues.
    #[tracing::instrument(skip_all)]
    pub(crate) fn flush(&mut self) {
        let shared = &self.shared;
        if shared.queue.is_empty() {
            return;
        }
        let mut guard = shared.schedule.lock();
        shared.wake_all(&mut guard);
        while !(guard.waiting == shared.workers() && shared.is_completed()) {
            shared.all_finished.wait(&mut guard);
        }
        tracing::debug!(commands = shared.queue.command_len(), "flushed batch");
        shared.queue.reset();
        for t in shared.tasks.iter() {
            t.cmd_cursor.store(0, Ordering::Release);
            t.calc_cursor.store(0, Ordering::Release);
        }
        drop(guard);
        shared.stats.flushed();
        self.posted = 0;
    }

    /// Finish queued work, stop every task and hand the threads back.
    pub(crate) fn shutdown(&mut self) {
        if self.lease.is_empty() {
            return;
        }
        let running = self.shared.tasks.iter().any(|t| t.state() != TaskState::Done);
        if running {
            self.flush();
        }
        let shared = &self.shared;
        shared.shutdown.raise();
        let mut guard = shared.schedule.lock();
        shared.wake_all(&mut guard);
        while guard.released < shared.workers() {
            shared.released.wait(&mut guard);
        }
        drop(guard);
        self.pool.release(std::mem::take(&mut self.lease));
        tracing::debug!("worker tasks stopped");
    }
}

impl Drop for WorkerManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/worker.rs"]
mod tests;
