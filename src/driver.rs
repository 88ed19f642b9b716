//=========================================================================
// Driver
//
// Per-tick orchestration of the state stack and command system.
//
// Architecture:
// ```text
//     DriverBuilder  ──build()──>  Driver  ──run()──>  [fixed-rate loop]
//         │                          │
//         ├─ with_tps()              └─ tick(dt):
//         ├─ with_max_ticks()            1. CommandSystem::update
//         └─ with_commands()             2. execute_stack (update → draw)
//                                        3. apply_all_pending_changes
//                                        4. Exit once the stack is empty
// ```
//
// Changes queued by states during a tick take effect at the tick
// boundary, after every state has been updated and drawn.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::thread;
use std::time::{Duration, Instant};

//=== External Crates =====================================================

use log::{debug, info};

//=== Internal Modules ====================================================

use crate::core::command::CommandSystem;
use crate::core::state::{StackError, StateStack};

//=== execute_stack() =====================================================

/// Runs one update-then-draw pass over `stack`.
///
/// Every update (and so every newly queued change) happens before any draw.
/// Pending changes are not applied here.
pub fn execute_stack(stack: &StateStack, dt: f32) {
    stack.update(dt);
    stack.draw();
}

//=== TickControl =========================================================

/// Whether the loop should keep ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Exit,
}

//=== DriverBuilder =======================================================

/// Builder for configuring a [`Driver`].
///
/// # Default Values
///
/// - **TPS**: 60.0 (ticks per second)
/// - **Max ticks**: unlimited
/// - **Commands**: none
///
/// # Example
///
/// ```rust
/// # use std::sync::Arc;
/// # use tantech_core::prelude::*;
/// struct Splash;
///
/// impl GameState for Splash {
///     fn update(&mut self, ctx: &StateContext<'_>, _dt: f32) -> bool {
///         ctx.queue_pop();
///         true
///     }
/// }
///
/// let stack = StateStack::new(StateHandle::new(Splash)).unwrap();
/// let mut driver = DriverBuilder::new()
///     .with_tps(1000.0)
///     .with_commands(CommandSystem::new(Arc::new(TypeMaskTable::new())))
///     .build(stack);
///
/// assert_eq!(driver.run().unwrap(), 1);
/// ```
pub struct DriverBuilder {
    tps: f64,
    max_ticks: Option<u64>,
    commands: Option<CommandSystem>,
}

impl DriverBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            tps: 60.0,
            max_ticks: None,
            commands: None,
        }
    }

    /// Sets the target ticks per second for [`Driver::run`].
    ///
    /// Each tick receives `1.0 / tps` as its delta time.
    ///
    /// Default: 60.0
    ///
    /// # Panics
    ///
    /// Panics if `tps <= 0.0`.
    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps > 0.0, "TPS must be positive, got {}", tps);
        self.tps = tps;
        self
    }

    /// Stops [`Driver::run`] after `ticks` ticks even if states remain.
    ///
    /// # Panics
    ///
    /// Panics if `ticks == 0`.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        assert!(ticks > 0, "Max ticks must be positive");
        self.max_ticks = Some(ticks);
        self
    }

    /// Dispatches `commands` at the start of every tick.
    pub fn with_commands(mut self, commands: CommandSystem) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Builds a driver around `stack`.
    pub fn build(self, stack: StateStack) -> Driver {
        info!(
            "Building driver (TPS: {}, max ticks: {:?})",
            self.tps, self.max_ticks
        );

        Driver {
            stack,
            commands: self.commands,
            tps: self.tps,
            max_ticks: self.max_ticks,
            ticks: 0,
        }
    }
}

impl Default for DriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Driver ==============================================================

/// Owns a state stack and optional command system and ticks them.
pub struct Driver {
    stack: StateStack,
    commands: Option<CommandSystem>,
    tps: f64,
    max_ticks: Option<u64>,
    ticks: u64,
}

impl Driver {
    //--- Execution --------------------------------------------------------

    /// Runs a single tick of `dt` seconds.
    ///
    /// # Errors
    ///
    /// Propagates the first [`StackError`] raised while applying changes.
    pub fn tick(&mut self, dt: f32) -> Result<TickControl, StackError> {
        self.ticks += 1;

        if let Some(commands) = self.commands.as_mut() {
            commands.update(dt);
        }

        execute_stack(&self.stack, dt);
        self.stack.apply_all_pending_changes()?;

        if self.stack.is_empty() {
            debug!("State stack empty after tick {}", self.ticks);
            return Ok(TickControl::Exit);
        }

        Ok(TickControl::Continue)
    }

    /// Ticks at the configured rate until the stack empties or the tick
    /// limit is reached. Returns the number of ticks run by this call.
    ///
    /// # Errors
    ///
    /// Stops and propagates the first [`StackError`] from [`Driver::tick`].
    pub fn run(&mut self) -> Result<u64, StackError> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.tps);
        let dt = frame_duration.as_secs_f32();
        let start_ticks = self.ticks;

        info!("Driver starting (TPS: {})", self.tps);

        loop {
            if self.max_ticks.is_some_and(|max| self.ticks - start_ticks >= max) {
                info!("Driver reached tick limit");
                break;
            }

            let frame_start = Instant::now();

            if let TickControl::Exit = self.tick(dt)? {
                info!("Driver exiting, no states left");
                break;
            }

            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                thread::sleep(frame_duration - elapsed);
            }
        }

        Ok(self.ticks - start_ticks)
    }

    //--- Accessors --------------------------------------------------------

    /// Returns the driven stack.
    pub fn stack(&self) -> &StateStack {
        &self.stack
    }

    /// Returns the command system, if one was configured.
    pub fn commands_mut(&mut self) -> Option<&mut CommandSystem> {
        self.commands.as_mut()
    }

    /// Returns the total number of ticks run.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
