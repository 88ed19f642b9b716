//=========================================================================
// State Stack
//=========================================================================
//
// Owns the ordered sequence of game states and applies structural changes.
//
// The sequence is only mutated through push/pop/clear, and those fail
// while update()/draw() hold the traversal borrow. Iteration therefore
// never observes a sequence that changes underneath it.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::{StackError, StateHandle};

//=== Pop Policy ==========================================================

/// Rule deciding which states a queued pop removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PopPolicy {
    /// Erases from the bottom of the stack through the popping state.
    ///
    /// States pushed after the popping state survive. Given `[A, B, C]`, a
    /// pop from `B` leaves `[C]` and a pop from `C` empties the stack.
    #[default]
    ThroughCaller,

    /// Erases the popping state and every state above it.
    ///
    /// Given `[A, B, C]`, a pop from `B` leaves `[A]`.
    CallerAndAbove,
}

//=== Stack Inner =========================================================

// Shared storage. States point back here through a Weak.
pub(crate) struct StackInner {
    states: RefCell<Vec<StateHandle>>,
    pop_policy: PopPolicy,
}

//=== StateStackBuilder ===================================================

/// Builder for configuring a [`StateStack`].
///
/// # Default Values
///
/// - **Pop policy**: [`PopPolicy::ThroughCaller`]
///
/// # Example
///
/// ```rust
/// # use tantech_core::prelude::*;
/// # struct Menu;
/// # impl GameState for Menu {
/// #     fn update(&mut self, _ctx: &StateContext<'_>, _dt: f32) -> bool { false }
/// # }
/// let stack = StateStackBuilder::new()
///     .with_pop_policy(PopPolicy::CallerAndAbove)
///     .build(StateHandle::new(Menu))
///     .unwrap();
///
/// assert_eq!(stack.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StateStackBuilder {
    pop_policy: PopPolicy,
}

impl StateStackBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rule applied when a state pops itself.
    pub fn with_pop_policy(mut self, policy: PopPolicy) -> Self {
        self.pop_policy = policy;
        self
    }

    /// Builds the stack with `initial` as its only state.
    ///
    /// # Errors
    ///
    /// - [`StackError::AlreadyAttached`] if `initial` belongs to another
    ///   stack.
    /// - [`StackError::Retired`] if `initial` was removed from a stack and
    ///   not reset.
    pub fn build(self, initial: StateHandle) -> Result<StateStack, StackError> {
        let stack = StateStack {
            inner: Rc::new(StackInner {
                states: RefCell::new(Vec::new()),
                pop_policy: self.pop_policy,
            }),
        };
        stack.push(initial)?;
        Ok(stack)
    }
}

//=== StateStack ==========================================================

/// Ordered stack of game states, bottom to top.
///
/// Cloning yields another handle to the same stack.
#[derive(Clone)]
pub struct StateStack {
    inner: Rc<StackInner>,
}

impl StateStack {
    //--- Construction -----------------------------------------------------

    /// Creates a stack holding `initial` with the default pop policy.
    ///
    /// # Errors
    ///
    /// Same as [`StateStackBuilder::build`].
    pub fn new(initial: StateHandle) -> Result<Self, StackError> {
        StateStackBuilder::new().build(initial)
    }

    pub(crate) fn from_inner(inner: Rc<StackInner>) -> Self {
        Self { inner }
    }

    //--- Structural Operations --------------------------------------------

    /// Pushes `state` on top of the stack immediately.
    ///
    /// # Errors
    ///
    /// - [`StackError::AlreadyAttached`] if `state` belongs to any live stack,
    ///   including this one.
    /// - [`StackError::Retired`] if `state` was removed from a stack and not
    ///   reset.
    /// - [`StackError::TraversalInProgress`] if called from inside
    ///   [`StateStack::update`] or [`StateStack::draw`].
    pub fn push(&self, state: StateHandle) -> Result<(), StackError> {
        if state.is_attached() {
            warn!("State {} already in a stack, skipping push", state.name());
            return Err(StackError::AlreadyAttached);
        }
        if state.is_retired() {
            warn!("State {} was removed from a stack, skipping push", state.name());
            return Err(StackError::Retired);
        }

        let mut states = self.states_mut()?;
        state.attach(Rc::downgrade(&self.inner));
        debug!("Pushing state {} at depth {}", state.name(), states.len());
        states.push(state);

        Ok(())
    }

    pub(crate) fn pop_at(&self, caller: &StateHandle) -> Result<(), StackError> {
        let removed: Vec<StateHandle> = {
            let mut states = self.states_mut()?;

            let range = match self.inner.pop_policy {
                PopPolicy::ThroughCaller => states
                    .iter()
                    .rposition(|s| s.ptr_eq(caller))
                    .map(|pos| 0..pos + 1),
                PopPolicy::CallerAndAbove => states
                    .iter()
                    .position(|s| s.ptr_eq(caller))
                    .map(|pos| pos..states.len()),
            };

            let Some(range) = range else {
                debug!("State {} not found in stack, skipping pop", caller.name());
                return Ok(());
            };

            states.drain(range).collect()
        };

        debug!(
            "Popped {} state(s) for {} ({:?})",
            removed.len(),
            caller.name(),
            self.inner.pop_policy
        );
        removed.iter().for_each(StateHandle::detach);

        Ok(())
    }

    pub(crate) fn clear(&self) -> Result<(), StackError> {
        let removed = std::mem::take(&mut *self.states_mut()?);

        debug!("Clearing {} state(s) from stack", removed.len());
        removed.iter().for_each(StateHandle::detach);

        Ok(())
    }

    /// Applies the queued changes of every state currently on the stack.
    ///
    /// States are visited bottom to top as they stand when the call begins.
    /// A state removed by an earlier state's changes is skipped; removal
    /// already discarded its queue. States pushed during this call are not
    /// visited.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error from
    /// [`StateHandle::apply_pending_changes`].
    pub fn apply_all_pending_changes(&self) -> Result<(), StackError> {
        let snapshot = self.states();

        for state in snapshot {
            if state.pending_changes() > 0 && state.belongs_to(&self.inner) {
                state.apply_pending_changes()?;
            }
        }

        Ok(())
    }

    //--- Traversal --------------------------------------------------------

    /// Updates every state, bottom to top.
    pub fn update(&self, dt: f32) {
        for state in self.states_ref().iter() {
            // Advisory only
            let _ = state.update(dt);
        }
    }

    /// Draws every state, bottom to top.
    pub fn draw(&self) {
        for state in self.states_ref().iter() {
            let _ = state.draw();
        }
    }

    //--- Queries ----------------------------------------------------------

    /// Returns the number of states on the stack.
    pub fn len(&self) -> usize {
        self.states_ref().len()
    }

    /// Returns true if the stack holds no states.
    pub fn is_empty(&self) -> bool {
        self.states_ref().is_empty()
    }

    /// Returns the most recently pushed state.
    pub fn top(&self) -> Option<StateHandle> {
        self.states_ref().last().cloned()
    }

    /// Returns true if `state` is on this stack.
    pub fn contains(&self, state: &StateHandle) -> bool {
        self.states_ref().iter().any(|s| s.ptr_eq(state))
    }

    /// Returns the states bottom to top.
    pub fn states(&self) -> Vec<StateHandle> {
        self.states_ref().clone()
    }

    /// Returns the rule applied when a state pops itself.
    pub fn pop_policy(&self) -> PopPolicy {
        self.inner.pop_policy
    }

    /// Returns true if both handles refer to the same stack.
    pub fn ptr_eq(&self, other: &StateStack) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    //--- Internal Helpers -------------------------------------------------

    pub(crate) fn is_traversing(&self) -> bool {
        self.inner.states.try_borrow_mut().is_err()
    }

    fn states_ref(&self) -> Ref<'_, Vec<StateHandle>> {
        self.inner.states.borrow()
    }

    fn states_mut(&self) -> Result<RefMut<'_, Vec<StateHandle>>, StackError> {
        self.inner.states.try_borrow_mut().map_err(|_| {
            warn!("Stack mutation attempted during traversal");
            StackError::TraversalInProgress
        })
    }
}

impl std::fmt::Debug for StateStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.states_ref().iter().map(StateHandle::name).collect();
        f.debug_struct("StateStack")
            .field("states", &names)
            .field("pop_policy", &self.inner.pop_policy)
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
