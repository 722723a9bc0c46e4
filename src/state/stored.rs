use std::sync::Arc;

use crate::pattern::context::PatternContext;
use crate::state::caps::CapsState;
use crate::state::clip::ClipState;

/// Save point pushed by `save()`.
///
/// Holds extra references only; nothing is copied until the engine mutates
/// its current state.
#[derive(Clone, Debug)]
pub(crate) struct StoredState {
    pub(crate) clip: Arc<ClipState>,
    pub(crate) caps: Arc<CapsState>,
    pub(crate) pattern: Option<Arc<PatternContext>>,
}

/// LIFO stack of save points.
#[derive(Debug, Default)]
pub(crate) struct StateStack {
    states: Vec<StoredState>,
}

impl StateStack {
    pub(crate) fn push(&mut self, state: StoredState) {
        self.states.push(state);
    }

    /// Pop the newest save point. `None` when the stack is empty.
    pub(crate) fn pop(&mut self) -> Option<StoredState> {
        self.states.pop()
    }

    pub(crate) fn depth(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/state/stored.rs"]
mod tests;
