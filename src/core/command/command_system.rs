//=========================================================================
// Command System
//=========================================================================
//
// Deferred, mask-filtered dispatch of commands to entities.
//
// Architecture:
//   queue_command() ──────────────┐
//   CommandSender ─→ channel ─→ inbox ─→ queue: Vec<Command>
//                                           ↓ update(dt)
//   CommandComponent::tracked() ─→ (entity, type mask) ─→ Command::execute
//                                           ↓
//                                     queue cleared
//
// Pattern: queue → dispatch once → clear → repeat
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, trace};

//=== Internal Dependencies ===============================================

use super::{Command, CommandComponent};

//=== CommandError ========================================================

/// Errors returned by [`CommandSender`].
#[derive(Debug)]
pub enum CommandError {
    /// The receiving command system was dropped. Carries the rejected command.
    Disconnected(Command),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected(command) => {
                write!(f, "Command system disconnected, dropped {:?}", command)
            }
        }
    }
}

impl std::error::Error for CommandError {}

//=== CommandSender =======================================================

/// Cloneable handle for queuing commands without access to the system.
///
/// Commands sent here join the system's queue at the start of its next
/// [`CommandSystem::update`], after commands queued directly. Senders may
/// live on other threads.
#[derive(Debug, Clone)]
pub struct CommandSender {
    sender: Sender<Command>,
}

impl CommandSender {
    /// Sends a command to the system's inbox.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Disconnected`] if the system no longer exists.
    pub fn send(&self, command: Command) -> Result<(), CommandError> {
        self.sender
            .send(command)
            .map_err(|e| CommandError::Disconnected(e.into_inner()))
    }
}

//=== CommandSystem =======================================================

/// Queues commands and dispatches each once against matching entities.
///
/// # Example
///
/// ```rust
/// # use std::sync::Arc;
/// # use std::sync::atomic::{AtomicUsize, Ordering};
/// # use tantech_core::prelude::*;
/// let table = Arc::new(TypeMaskTable::new());
/// let door = table.spawn(Mask::from_bits_retain(0b01));
/// let _player = table.spawn(Mask::from_bits_retain(0b10));
///
/// let opened = Arc::new(AtomicUsize::new(0));
/// let counter = opened.clone();
///
/// let mut commands = CommandSystem::new(table);
/// commands.queue_command(Command::new(Mask::from_bits_retain(0b01), move |e: Entity, _dt: f32| {
///     assert_eq!(e, door);
///     counter.fetch_add(1, Ordering::SeqCst);
/// }));
/// commands.update(0.016);
///
/// assert_eq!(opened.load(Ordering::SeqCst), 1);
/// assert_eq!(commands.pending(), 0);
/// ```
pub struct CommandSystem {
    component: Arc<dyn CommandComponent>,
    queue: Vec<Command>,
    inbox: Receiver<Command>,
    sender: Sender<Command>,
}

impl CommandSystem {
    //--- Construction -----------------------------------------------------

    /// Creates a system dispatching against the entities of `component`.
    pub fn new(component: Arc<dyn CommandComponent>) -> Self {
        let (sender, inbox) = unbounded();
        Self {
            component,
            queue: Vec::new(),
            inbox,
            sender,
        }
    }

    //--- Queueing ---------------------------------------------------------

    /// Appends `command` to the queue.
    ///
    /// No deduplication: queuing the same command twice dispatches it twice.
    /// Clone a command to queue a copy while keeping the original.
    pub fn queue_command(&mut self, command: Command) {
        trace!("Queued {:?}", command);
        self.queue.push(command);
    }

    /// Returns a sender feeding this system's inbox.
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            sender: self.sender.clone(),
        }
    }

    //--- Update Loop ------------------------------------------------------

    /// Dispatches every queued command, then clears the queue.
    ///
    /// Each command runs on every tracked entity whose type mask intersects
    /// its dispatch mask, in queue order. Commands sent while dispatching
    /// wait for the next update. A panicking effect propagates to the
    /// caller.
    pub fn update(&mut self, dt: f32) {
        self.queue.extend(self.inbox.try_iter());
        if self.queue.is_empty() {
            return;
        }

        let mut commands = std::mem::take(&mut self.queue);
        let mut executions = 0usize;

        for command in &commands {
            for (entity, type_mask) in self.component.tracked() {
                if command.selects(entity, type_mask) {
                    command.execute(entity, dt);
                    executions += 1;
                }
            }
        }

        debug!(
            "Dispatched {} command(s), {} execution(s)",
            commands.len(),
            executions
        );

        // Hand the allocation back for the next tick
        commands.clear();
        self.queue = commands;
    }

    //--- Query API --------------------------------------------------------

    /// Returns the number of commands waiting for the next update.
    pub fn pending(&self) -> usize {
        self.queue.len() + self.inbox.len()
    }

    /// Returns the component entities are read from.
    pub fn component(&self) -> &Arc<dyn CommandComponent> {
        &self.component
    }
}

impl std::fmt::Debug for CommandSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSystem")
            .field("queue", &self.queue)
            .field("inbox", &self.inbox.len())
            .finish_non_exhaustive()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::{Entity, Mask, TypeMaskTable};
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<(&'static str, Entity)>>>;

    fn recorder(label: &'static str, mask: Mask, log: &Log) -> Command {
        let log = log.clone();
        Command::new(mask, move |e: Entity, _dt: f32| {
            log.lock().unwrap().push((label, e));
        })
    }

    fn two_entities() -> (Arc<TypeMaskTable>, Entity, Entity) {
        let table = Arc::new(TypeMaskTable::new());
        let e1 = table.spawn(Mask::from_bits_retain(0b01));
        let e2 = table.spawn(Mask::from_bits_retain(0b10));
        (table, e1, e2)
    }

    #[test]
    fn command_reaches_only_matching_entity_once() {
        let (table, e1, _e2) = two_entities();
        let log = Log::default();
        let mut system = CommandSystem::new(table);

        system.queue_command(recorder("a", Mask::from_bits_retain(0b01), &log));
        system.update(0.016);

        assert_eq!(*log.lock().unwrap(), vec![("a", e1)]);
        assert_eq!(system.pending(), 0);

        system.update(0.016);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn overlapping_commands_run_in_queue_order() {
        let table = Arc::new(TypeMaskTable::new());
        let e = table.spawn(Mask::from_bits_retain(0b11));
        let log = Log::default();
        let mut system = CommandSystem::new(table);

        system.queue_command(recorder("first", Mask::from_bits_retain(0b01), &log));
        system.queue_command(recorder("second", Mask::from_bits_retain(0b10), &log));
        system.update(0.016);

        assert_eq!(*log.lock().unwrap(), vec![("first", e), ("second", e)]);
    }

    #[test]
    fn duplicate_commands_are_not_deduplicated() {
        let (table, e1, _e2) = two_entities();
        let log = Log::default();
        let mut system = CommandSystem::new(table);

        let command = recorder("dup", Mask::from_bits_retain(0b01), &log);
        system.queue_command(command.clone());
        system.queue_command(command);
        assert_eq!(system.pending(), 2);

        system.update(0.016);
        assert_eq!(*log.lock().unwrap(), vec![("dup", e1), ("dup", e1)]);
    }

    #[test]
    fn zero_intersection_is_silent_noop() {
        let (table, _e1, _e2) = two_entities();
        let log = Log::default();
        let mut system = CommandSystem::new(table);

        system.queue_command(recorder("none", Mask::from_bits_retain(0b100), &log));
        system.queue_command(recorder("empty", Mask::NONE, &log));
        system.update(0.016);

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(system.pending(), 0);
    }

    #[test]
    fn broad_mask_reaches_every_category() {
        let (table, e1, e2) = two_entities();
        let log = Log::default();
        let mut system = CommandSystem::new(table);

        system.queue_command(recorder("all", Mask::ALL, &log));
        system.update(0.016);

        assert_eq!(*log.lock().unwrap(), vec![("all", e1), ("all", e2)]);
    }

    #[test]
    fn effect_receives_tick_delta() {
        let (table, _e1, _e2) = two_entities();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut system = CommandSystem::new(table);

        system.queue_command(Command::new(Mask::from_bits_retain(0b10), move |_: Entity, dt: f32| {
            sink.lock().unwrap().push(dt);
        }));
        system.update(0.25);

        assert_eq!(*seen.lock().unwrap(), vec![0.25]);
    }

    #[test]
    fn mask_changes_are_visible_to_later_commands() {
        let (table, e1, _e2) = two_entities();
        let log = Log::default();
        let mut system = CommandSystem::new(table.clone());

        let retype = table.clone();
        system.queue_command(Command::new(Mask::from_bits_retain(0b01), move |e: Entity, _: f32| {
            retype.set_type_mask(e, Mask::from_bits_retain(0b100));
        }));
        system.queue_command(recorder("after", Mask::from_bits_retain(0b100), &log));
        system.update(0.016);

        assert_eq!(*log.lock().unwrap(), vec![("after", e1)]);
    }

    #[test]
    fn sender_commands_join_after_direct_queue() {
        let table = Arc::new(TypeMaskTable::new());
        let e = table.spawn(Mask::from_bits_retain(1));
        let log = Log::default();
        let mut system = CommandSystem::new(table);
        let sender = system.sender();

        sender.send(recorder("sent", Mask::from_bits_retain(1), &log)).unwrap();
        system.queue_command(recorder("direct", Mask::from_bits_retain(1), &log));
        assert_eq!(system.pending(), 2);

        system.update(0.016);
        assert_eq!(*log.lock().unwrap(), vec![("direct", e), ("sent", e)]);
        assert_eq!(system.pending(), 0);
    }

    #[test]
    fn commands_sent_during_dispatch_wait_for_next_update() {
        let table = Arc::new(TypeMaskTable::new());
        let e = table.spawn(Mask::from_bits_retain(1));
        let log = Log::default();
        let mut system = CommandSystem::new(table);
        let sender = system.sender();

        let follow_up = recorder("follow-up", Mask::from_bits_retain(1), &log);
        system.queue_command(Command::new(Mask::from_bits_retain(1), move |_: Entity, _: f32| {
            sender.send(follow_up.clone()).unwrap();
        }));

        system.update(0.016);
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(system.pending(), 1);

        system.update(0.016);
        assert_eq!(*log.lock().unwrap(), vec![("follow-up", e)]);
    }

    #[test]
    fn sender_from_other_thread() {
        let (table, _e1, e2) = two_entities();
        let log = Log::default();
        let mut system = CommandSystem::new(table);
        let sender = system.sender();
        let command = recorder("thread", Mask::from_bits_retain(0b10), &log);

        std::thread::spawn(move || sender.send(command).unwrap())
            .join()
            .unwrap();
        system.update(0.016);

        assert_eq!(*log.lock().unwrap(), vec![("thread", e2)]);
    }

    #[test]
    fn send_after_drop_returns_command() {
        let (table, _e1, _e2) = two_entities();
        let system = CommandSystem::new(table);
        let sender = system.sender();
        drop(system);

        match sender.send(Command::noop(Mask::from_bits_retain(1)).with_tag(5)) {
            Err(CommandError::Disconnected(command)) => assert_eq!(command.tag(), Some(5)),
            Ok(()) => panic!("send should fail once the system is dropped"),
        }
    }

    #[test]
    fn repeated_empty_updates_leave_queue_empty() {
        let (table, _e1, _e2) = two_entities();
        let mut system = CommandSystem::new(table);
        for _ in 0..5 {
            system.update(0.016);
        }
        assert_eq!(system.pending(), 0);
    }
}
