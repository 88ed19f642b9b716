//=========================================================================
// Command Bindings
//=========================================================================
//
// Maps input events to commands that are re-queued on every match.
//
// Architecture:
//   (key, kind) → HashMap → Vec<Command> → CommandSystem::queue_command
//
// Commands live for one tick, so a binding is the persistence: each
// matching event queues a fresh copy.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use log::debug;

//=== Internal Dependencies ===============================================

use super::{Command, CommandSystem};

//=== InputKind ===========================================================

/// Edge of an input event a binding reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Key or button went down.
    Press,

    /// Key or button went up.
    Release,
}

//=== CommandBindings =====================================================

/// Table of commands bound to input keys.
///
/// `K` is whatever the application uses to identify keys.
///
/// ```
/// # use std::sync::Arc;
/// # use tantech_core::prelude::*;
/// let mut bindings = CommandBindings::new();
/// bindings.bind('w', InputKind::Press, Command::noop(Mask::from_bits_retain(0b10)));
///
/// let mut commands = CommandSystem::new(Arc::new(TypeMaskTable::new()));
/// assert_eq!(bindings.trigger(&'w', InputKind::Press, &mut commands), 1);
/// assert_eq!(bindings.trigger(&'w', InputKind::Release, &mut commands), 0);
/// assert_eq!(commands.pending(), 1);
/// ```
pub struct CommandBindings<K> {
    bindings: HashMap<(K, InputKind), Vec<Command>>,
}

impl<K> CommandBindings<K>
where
    K: Eq + Hash + Debug,
{
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    //--- Binding API ------------------------------------------------------

    /// Binds `command` to `key`. Several commands may share one key; they
    /// are queued in binding order.
    pub fn bind(&mut self, key: K, kind: InputKind, command: Command) {
        debug!("Binding {:?} ({:?}) to {:?}", key, kind, command);
        self.bindings.entry((key, kind)).or_default().push(command);
    }

    /// Removes every command bound to `key` for `kind`.
    pub fn unbind(&mut self, key: K, kind: InputKind) {
        self.bindings.remove(&(key, kind));
    }

    /// Removes all bindings.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Returns true if any command is bound to `key` for `kind`.
    pub fn is_bound(&self, key: K, kind: InputKind) -> bool {
        self.bindings.contains_key(&(key, kind))
    }

    //--- Event Mapping ----------------------------------------------------

    /// Queues a copy of every command bound to `key` for `kind`.
    ///
    /// Returns the number of commands queued.
    pub fn trigger(&self, key: &K, kind: InputKind, system: &mut CommandSystem) -> usize
    where
        K: Clone,
    {
        let Some(commands) = self.bindings.get(&(key.clone(), kind)) else {
            return 0;
        };

        for command in commands {
            system.queue_command(command.clone());
        }

        commands.len()
    }
}

impl<K> Default for CommandBindings<K>
where
    K: Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
