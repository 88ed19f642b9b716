//=========================================================================
// Change Queue
//=========================================================================
//
// Per-state queue of pending structural changes.
//
// A state queues changes here during its own update. Nothing touches the
// stack until the state applies its queue in a separate phase.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::StateHandle;

//=== Change ==============================================================

/// A structural mutation of a stack that has not been applied yet.
#[derive(Clone)]
pub enum Change {
    /// Places a new state above the current top.
    Push(StateHandle),

    /// Removes the queuing state according to the stack's pop policy.
    Pop,

    /// Empties the whole stack.
    Clear,
}

impl std::fmt::Debug for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Push(state) => f.debug_tuple("Push").field(&state.name()).finish(),
            Self::Pop => write!(f, "Pop"),
            Self::Clear => write!(f, "Clear"),
        }
    }
}

//=== Change Queue ========================================================

/// FIFO queue of changes owned by a single state.
#[derive(Debug)]
pub(crate) struct ChangeQueue {
    queue: Vec<Change>,
}

impl ChangeQueue {
    /// Creates a new empty change queue.
    pub(crate) fn new() -> Self {
        Self { queue: Vec::new() }
    }

    /// Queues a change to be applied later.
    pub(crate) fn push(&mut self, change: Change) {
        self.queue.push(change);
    }

    /// Returns the number of queued changes.
    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    /// Takes all changes from the queue, leaving it empty.
    pub(crate) fn take(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.queue)
    }
}

impl Default for ChangeQueue {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
