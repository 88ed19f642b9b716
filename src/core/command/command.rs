//=========================================================================
// Command
//=========================================================================
//
// Immutable dispatch record: a mask selecting entity categories plus the
// effect to run on each selected entity.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

//=== Internal Dependencies ===============================================

use super::{Entity, Mask};

//=== CommandEffect Trait =================================================

/// Behavior executed by a [`Command`] on each entity it reaches.
///
/// Implemented for every `Fn(Entity, f32)` closure. Implement it directly
/// when an effect needs targeting beyond the mask test.
///
/// ```
/// # use tantech_core::prelude::*;
/// // Only reaches even entity ids.
/// struct EvenOnly;
///
/// impl CommandEffect for EvenOnly {
///     fn execute(&self, _entity: Entity, _dt: f32) {}
///
///     fn targets(&self, entity: Entity, _type_mask: Mask) -> bool {
///         entity.id() % 2 == 0
///     }
/// }
///
/// let command = Command::new(Mask::ALL, EvenOnly);
/// ```
pub trait CommandEffect: Send + Sync {
    /// Runs the effect on `entity` for a tick of `dt` seconds.
    fn execute(&self, entity: Entity, dt: f32);

    /// Further filters entities that already passed the mask test.
    fn targets(&self, _entity: Entity, _type_mask: Mask) -> bool {
        true
    }
}

impl<F> CommandEffect for F
where
    F: Fn(Entity, f32) + Send + Sync,
{
    fn execute(&self, entity: Entity, dt: f32) {
        self(entity, dt)
    }
}

//=== Command =============================================================

/// A transient, masked effect queued on a
/// [`CommandSystem`](super::CommandSystem).
///
/// Commands are cheap to clone; clones share the effect.
#[derive(Clone)]
pub struct Command {
    mask: Mask,
    tag: Option<u32>,
    effect: Arc<dyn CommandEffect>,
}

impl Command {
    /// Creates a command reaching entities whose type mask intersects `mask`.
    pub fn new<E>(mask: Mask, effect: E) -> Self
    where
        E: CommandEffect + 'static,
    {
        Self {
            mask,
            tag: None,
            effect: Arc::new(effect),
        }
    }

    /// Creates a command whose effect does nothing.
    pub fn noop(mask: Mask) -> Self {
        Self::new(mask, |_: Entity, _: f32| {})
    }

    /// Attaches an identity tag, e.g. the script function that produced it.
    pub fn with_tag(mut self, tag: u32) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Returns the dispatch mask.
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Returns the identity tag, if any.
    pub fn tag(&self) -> Option<u32> {
        self.tag
    }

    //--- Dispatch ---------------------------------------------------------

    /// Returns true if the command reaches an entity with `type_mask`.
    pub(crate) fn selects(&self, entity: Entity, type_mask: Mask) -> bool {
        self.mask.intersects(type_mask) && self.effect.targets(entity, type_mask)
    }

    pub(crate) fn execute(&self, entity: Entity, dt: f32) {
        self.effect.execute(entity, dt);
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("mask", &format_args!("{:#b}", self.mask.bits()))
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
