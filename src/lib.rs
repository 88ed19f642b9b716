//=========================================================================
// Tantech Core Library Root
//
// This crate defines the per-tick control flow of a real-time application.
//
// Responsibilities:
// - Stack-based application states with deferred structural changes
// - Mask-filtered, single-tick command dispatch to entities
// - A driver tying both together into an update → draw → apply loop
//
// Typical usage:
// ```no_run
// use tantech_core::prelude::*;
//
// let stack = StateStack::new(StateHandle::new(Title)).unwrap();
// DriverBuilder::new().build(stack).run().unwrap();
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` contains the state machine and command dispatch. Rendering,
// scripting and asset loading live outside this crate and reach it
// through the `GameState` and `CommandComponent` traits.
//
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `driver` holds the tick loop and its builder, re-exported below.
//
mod driver;

//--- Public Exports ------------------------------------------------------

pub use driver::{execute_stack, Driver, DriverBuilder, TickControl};
