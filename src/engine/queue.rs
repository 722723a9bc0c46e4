//! Fixed-capacity action queues shared by the producer and the workers.
//!
//! Only the producer appends. Workers read slots below the published length
//! with their own monotonically advancing cursors. Lengths are reset to zero
//! by the producer at flush, while every worker is idle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::engine::action::{Calculation, Command};

const SLOT_EMPTY: u8 = 0;
const SLOT_FILLED: u8 = 1;
const SLOT_CLAIMED: u8 = 2;

/// Slot whose value can be taken by exactly one of many racing threads.
pub(crate) struct ClaimSlot<T> {
    state: AtomicU8,
    value: Mutex<Option<T>>,
}

impl<T> Default for ClaimSlot<T> {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(SLOT_EMPTY),
            value: Mutex::new(None),
        }
    }
}

impl<T> ClaimSlot<T> {
    pub(crate) fn fill(&self, v: T) {
        *self.value.lock() = Some(v);
        self.state.store(SLOT_FILLED, Ordering::Release);
    }

    /// Take the value if no other thread has. Only the winner of the
    /// compare-exchange ever sees `Some`.
    pub(crate) fn claim(&self) -> Option<T> {
        self.state
            .compare_exchange(SLOT_FILLED, SLOT_CLAIMED, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.value.lock().take()
    }

    #[cfg(test)]
    pub(crate) fn is_filled(&self) -> bool {
        self.state.load(Ordering::Acquire) == SLOT_FILLED
    }

    pub(crate) fn clear(&self) {
        self.state.store(SLOT_EMPTY, Ordering::Release);
        self.value.lock().take();
    }
}

/// Command and calculation queues of one engine.
pub(crate) struct ActionQueue {
    commands: Box<[Mutex<Option<Arc<Command>>>]>,
    command_len: AtomicUsize,
    calcs: Box<[ClaimSlot<Calculation>]>,
    calc_len: AtomicUsize,
}

impl ActionQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            commands: (0..capacity).map(|_| Mutex::new(None)).collect(),
            command_len: AtomicUsize::new(0),
            calcs: (0..capacity).map(|_| ClaimSlot::default()).collect(),
            calc_len: AtomicUsize::new(0),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.commands.len()
    }

    pub(crate) fn command_len(&self) -> usize {
        self.command_len.load(Ordering::Acquire)
    }

    pub(crate) fn calc_len(&self) -> usize {
        self.calc_len.load(Ordering::Acquire)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.command_len() == 0
    }

    pub(crate) fn is_full(&self) -> bool {
        self.command_len() >= self.capacity()
    }

    /// Append a command and its calculation. Producer only; the queue must
    /// not be full.
    pub(crate) fn push(&self, command: Arc<Command>, calc: Option<Calculation>) {
        if let Some(calc) = calc {
            let i = self.calc_len.load(Ordering::Relaxed);
            self.calcs[i].fill(calc);
            self.calc_len.store(i + 1, Ordering::Release);
        }
        let i = self.command_len.load(Ordering::Relaxed);
        *self.commands[i].lock() = Some(command);
        self.command_len.store(i + 1, Ordering::Release);
    }

    pub(crate) fn command(&self, i: usize) -> Option<Arc<Command>> {
        self.commands[i].lock().clone()
    }

    /// Drop the queue's reference to command `i`.
    pub(crate) fn release_command(&self, i: usize) {
        self.commands[i].lock().take();
    }

    pub(crate) fn claim_calc(&self, i: usize) -> Option<Calculation> {
        self.calcs[i].claim()
    }

    #[cfg(test)]
    pub(crate) fn calc_pending(&self, i: usize) -> bool {
        self.calcs[i].is_filled()
    }

    /// Empty both queues. Producer only, with every worker idle.
    pub(crate) fn reset(&self) {
        let commands = self.command_len.swap(0, Ordering::AcqRel);
        for slot in &self.commands[..commands] {
            slot.lock().take();
        }
        let calcs = self.calc_len.swap(0, Ordering::AcqRel);
        for slot in &self.calcs[..calcs] {
            slot.clear();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/queue.rs"]
mod tests;
