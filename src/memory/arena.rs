//! Block-based bump allocator for per-command payloads.
//!
//! Blocks keep a `used` word count that is only ever decremented by freeing a
//! slice, from any thread. Space inside a block is never reclaimed piecewise:
//! a block becomes reusable as a whole once its count drops back to zero.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::foundation::error::{PaintError, PaintResult};

/// 8000 bytes of 32-bit words.
pub(crate) const DEFAULT_BLOCK_WORDS: usize = 2000;

struct Block {
    id: u64,
    words: Box<[AtomicU32]>,
    // Only advanced while the arena lock is held.
    cursor: AtomicUsize,
    used: AtomicUsize,
}

impl Block {
    fn new(id: u64, capacity: usize) -> PaintResult<Self> {
        let mut words = Vec::new();
        words.try_reserve_exact(capacity).map_err(|e| {
            PaintError::out_of_memory(format!("arena block of {capacity} words: {e}"))
        })?;
        words.extend((0..capacity).map(|_| AtomicU32::new(0)));
        Ok(Self {
            id,
            words: words.into_boxed_slice(),
            cursor: AtomicUsize::new(0),
            used: AtomicUsize::new(0),
        })
    }

    fn remaining(&self) -> usize {
        self.words.len() - self.cursor.load(Ordering::Relaxed)
    }
}

/// Allocation handle. Dropping it frees the words back to the owning block.
pub(crate) struct ArenaSlice {
    block: Arc<Block>,
    start: usize,
    len: usize,
}

impl ArenaSlice {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub(crate) fn block_id(&self) -> u64 {
        self.block.id
    }

    #[inline]
    pub(crate) fn get(&self, i: usize) -> u32 {
        self.words()[i].load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set(&self, i: usize, v: u32) {
        self.words()[i].store(v, Ordering::Relaxed);
    }

    fn words(&self) -> &[AtomicU32] {
        &self.block.words[self.start..self.start + self.len]
    }
}

impl Drop for ArenaSlice {
    fn drop(&mut self) {
        self.block.used.fetch_sub(self.len, Ordering::AcqRel);
    }
}

impl fmt::Debug for ArenaSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaSlice")
            .field("block", &self.block.id)
            .field("start", &self.start)
            .field("len", &self.len)
            .finish()
    }
}

/// Allocation counters for an [`Arena`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArenaStats {
    pub(crate) system_blocks: u64,
    pub(crate) reused_blocks: u64,
    pub(crate) live_blocks: usize,
}

pub(crate) struct Arena {
    block_words: usize,
    // Index 0 is the head block that new allocations bump from.
    blocks: Mutex<Vec<Arc<Block>>>,
    system_blocks: AtomicU64,
    reused_blocks: AtomicU64,
}

impl Arena {
    pub(crate) fn new(block_words: usize) -> Self {
        Self {
            block_words: block_words.max(1),
            blocks: Mutex::new(Vec::new()),
            system_blocks: AtomicU64::new(0),
            reused_blocks: AtomicU64::new(0),
        }
    }

    /// Reserve `words` contiguous words.
    ///
    /// Fails with `OutOfMemory` when the request exceeds the block capacity or
    /// the system refuses a new block.
    pub(crate) fn alloc(&self, words: usize) -> PaintResult<ArenaSlice> {
        if words == 0 {
            return Err(PaintError::invalid_argument("arena allocation of zero words"));
        }
        if words > self.block_words {
            return Err(PaintError::out_of_memory(format!(
                "arena allocation of {words} words exceeds block capacity {}",
                self.block_words
            )));
        }

        let mut blocks = self.blocks.lock();
        if let Some(head) = blocks.first()
            && head.remaining() >= words
        {
            return Ok(carve(head, words));
        }

        if let Some(i) = blocks
            .iter()
            .position(|b| b.used.load(Ordering::Acquire) == 0)
        {
            let block = blocks.remove(i);
            block.cursor.store(0, Ordering::Relaxed);
            blocks.insert(0, block);
            self.reused_blocks.fetch_add(1, Ordering::Relaxed);
            return Ok(carve(&blocks[0], words));
        }

        let id = self.system_blocks.fetch_add(1, Ordering::Relaxed);
        let block = Arc::new(Block::new(id, self.block_words)?);
        let slice = carve(&block, words);
        blocks.insert(0, block);
        Ok(slice)
    }

    /// Drop every block. All slices must have been freed.
    ///
    /// # Panics
    ///
    /// Panics if any block still has live allocations.
    pub(crate) fn reset(&self) {
        let mut blocks = self.blocks.lock();
        for b in blocks.iter() {
            let used = b.used.load(Ordering::Acquire);
            assert!(
                used == 0,
                "arena reset with {used} live words in block {}",
                b.id
            );
        }
        blocks.clear();
    }

    pub(crate) fn stats(&self) -> ArenaStats {
        ArenaStats {
            system_blocks: self.system_blocks.load(Ordering::Relaxed),
            reused_blocks: self.reused_blocks.load(Ordering::Relaxed),
            live_blocks: self.blocks.lock().len(),
        }
    }
}

fn carve(block: &Arc<Block>, words: usize) -> ArenaSlice {
    let start = block.cursor.fetch_add(words, Ordering::Relaxed);
    block.used.fetch_add(words, Ordering::AcqRel);
    ArenaSlice {
        block: Arc::clone(block),
        start,
        len: words,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/memory/arena.rs"]
mod tests;
