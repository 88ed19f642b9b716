//=========================================================================
// State System
//=========================================================================
//
// Stack-based application state machine with deferred structural changes.
//
// Architecture:
//   StateStack
//     └─ states: Vec<StateHandle>  (bottom → top, strong ownership)
//
//   StateHandle
//     ├─ link: owning stack (Weak) + ChangeQueue
//     └─ state: Box<dyn GameState>
//
// Flow:
//   update()/draw() → GameState::update()/draw()  (queue changes only)
//   apply_pending_changes()                        (mutate the stack)
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, warn};

//=== Module Declarations =================================================

mod change_queue;
mod error;
mod state_stack;

//=== Public API ==========================================================

pub use change_queue::Change;
pub use error::{ErrorKind, StackError};
pub use state_stack::{PopPolicy, StateStack, StateStackBuilder};

//=== Internal Dependencies ===============================================

use change_queue::ChangeQueue;
use state_stack::StackInner;

//=== GameState Trait =====================================================

/// A unit of application behavior living on a [`StateStack`].
///
/// Every state on the stack is updated and drawn each tick, bottom to top.
/// The returned booleans are advisory: the stack never inspects them, they
/// exist for whatever orchestrates the state from outside.
///
/// # Minimal Implementation
///
/// ```rust
/// # use tantech_core::prelude::*;
/// struct Title;
///
/// impl GameState for Title {
///     fn update(&mut self, ctx: &StateContext<'_>, _dt: f32) -> bool {
///         ctx.queue_pop();
///         true
///     }
/// }
/// ```
pub trait GameState {
    /// Advances the state by `dt` seconds.
    ///
    /// Structural changes may only be queued through `ctx`; they take effect
    /// when the state's pending changes are applied.
    fn update(&mut self, ctx: &StateContext<'_>, dt: f32) -> bool;

    /// Draws the state. Default implementation draws nothing.
    fn draw(&mut self) -> bool {
        false
    }
}

//=== Link ================================================================

// Association between a state and its owning stack.
#[derive(Default)]
struct Link {
    stack: Option<Weak<StackInner>>,
    pending: ChangeQueue,
    retired: bool,
}

struct StateCell {
    name: &'static str,
    link: RefCell<Link>,
    state: RefCell<Box<dyn GameState>>,
}

//=== StateContext ========================================================

/// View of a state's change queue handed to [`GameState::update`].
pub struct StateContext<'a> {
    link: &'a RefCell<Link>,
}

impl StateContext<'_> {
    /// Queues `state` to be pushed above the current top.
    pub fn queue_push(&self, state: StateHandle) {
        self.link.borrow_mut().pending.push(Change::Push(state));
    }

    /// Queues removal of this state.
    pub fn queue_pop(&self) {
        self.link.borrow_mut().pending.push(Change::Pop);
    }

    /// Queues removal of every state on the stack.
    pub fn queue_clear(&self) {
        self.link.borrow_mut().pending.push(Change::Clear);
    }

    /// Returns the number of changes this state has queued.
    pub fn pending_changes(&self) -> usize {
        self.link.borrow().pending.len()
    }
}

//=== StateHandle =========================================================

/// Shared handle to a [`GameState`].
///
/// Identity is the handle's allocation: clones refer to the same state.
/// A state belongs to at most one stack; the stack holds a strong handle
/// and the state only a weak back-reference.
///
/// A state removed by a pop or clear is retired: its queue is discarded
/// and it cannot be pushed again until [`StateHandle::reset`] is called.
#[derive(Clone)]
pub struct StateHandle(Rc<StateCell>);

impl StateHandle {
    /// Wraps `state` in a new, unattached handle.
    pub fn new<T>(state: T) -> Self
    where
        T: GameState + 'static,
    {
        Self(Rc::new(StateCell {
            name: std::any::type_name::<T>(),
            link: RefCell::new(Link::default()),
            state: RefCell::new(Box::new(state)),
        }))
    }

    //--- Deferred Changes -------------------------------------------------

    /// Queues `state` to be pushed above the current top.
    pub fn queue_push(&self, state: StateHandle) {
        self.context().queue_push(state);
    }

    /// Queues removal of this state according to the stack's [`PopPolicy`].
    pub fn queue_pop(&self) {
        self.context().queue_pop();
    }

    /// Queues removal of every state on the stack.
    pub fn queue_clear(&self) {
        self.context().queue_clear();
    }

    /// Applies this state's queued changes to its stack in FIFO order.
    ///
    /// The queue is emptied even when a change fails; changes before the
    /// failing one stay applied, the failing change and any after it are
    /// discarded.
    ///
    /// # Errors
    ///
    /// - [`StackError::NotAttached`] if the state has no live stack; nothing
    ///   is mutated and the queue is kept.
    /// - [`StackError::TraversalInProgress`] if the stack is being updated or
    ///   drawn; the queue is kept.
    /// - [`StackError::AlreadyAttached`] if a queued push names a state that
    ///   already belongs to a stack.
    /// - [`StackError::Retired`] if a queued push names a retired state.
    pub fn apply_pending_changes(&self) -> Result<(), StackError> {
        let Some(stack) = self.stack() else {
            warn!("State {} not associated with a stack", self.name());
            return Err(StackError::NotAttached);
        };

        if stack.is_traversing() {
            warn!("State {} cannot apply changes during traversal", self.name());
            return Err(StackError::TraversalInProgress);
        }

        let changes = self.0.link.borrow_mut().pending.take();
        for change in changes {
            debug!("State {} applying {:?}", self.name(), change);
            match change {
                Change::Push(state) => stack.push(state)?,
                Change::Pop => stack.pop_at(self)?,
                Change::Clear => stack.clear()?,
            }
        }

        Ok(())
    }

    /// Makes a retired state pushable again and drops any queued changes.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::AlreadyAttached`] if the state belongs to a
    /// live stack.
    pub fn reset(&self) -> Result<(), StackError> {
        if self.is_attached() {
            warn!("State {} still in a stack, skipping reset", self.name());
            return Err(StackError::AlreadyAttached);
        }

        let dropped = {
            let mut link = self.0.link.borrow_mut();
            link.retired = false;
            link.pending.take()
        };
        debug!("State {} reset, {} change(s) dropped", self.name(), dropped.len());

        Ok(())
    }

    //--- Queries ----------------------------------------------------------

    /// Returns the stack owning this state, if it is still alive.
    pub fn stack(&self) -> Option<StateStack> {
        self.0
            .link
            .borrow()
            .stack
            .as_ref()
            .and_then(Weak::upgrade)
            .map(StateStack::from_inner)
    }

    /// Returns true if the state belongs to a live stack.
    pub fn is_attached(&self) -> bool {
        self.stack().is_some()
    }

    /// Returns true if the state was removed from a stack and not reset.
    pub fn is_retired(&self) -> bool {
        self.0.link.borrow().retired
    }

    /// Returns the number of changes waiting to be applied.
    pub fn pending_changes(&self) -> usize {
        self.0.link.borrow().pending.len()
    }

    /// Returns the type name of the wrapped state.
    pub fn name(&self) -> &'static str {
        self.0.name
    }

    /// Returns true if both handles refer to the same state.
    pub fn ptr_eq(&self, other: &StateHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    //--- Internal Helpers -------------------------------------------------

    fn context(&self) -> StateContext<'_> {
        StateContext { link: &self.0.link }
    }

    pub(crate) fn attach(&self, stack: Weak<StackInner>) {
        self.0.link.borrow_mut().stack = Some(stack);
    }

    // Queued handles are released after the borrow ends.
    pub(crate) fn detach(&self) {
        let discarded = {
            let mut link = self.0.link.borrow_mut();
            link.stack = None;
            link.retired = true;
            link.pending.take()
        };
        if !discarded.is_empty() {
            debug!("State {} removed, {} change(s) discarded", self.name(), discarded.len());
        }
    }

    pub(crate) fn belongs_to(&self, stack: &Rc<StackInner>) -> bool {
        self.0
            .link
            .borrow()
            .stack
            .as_ref()
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Rc::as_ptr(stack)))
    }

    pub(crate) fn update(&self, dt: f32) -> bool {
        let ctx = self.context();
        self.0.state.borrow_mut().update(&ctx, dt)
    }

    pub(crate) fn draw(&self) -> bool {
        self.0.state.borrow_mut().draw()
    }
}

impl std::fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateHandle")
            .field("name", &self.name())
            .field("attached", &self.is_attached())
            .field("retired", &self.is_retired())
            .field("pending", &self.pending_changes())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
