//=========================================================================
// Core Systems
//
// The two systems run once per tick by the driver.
//
// Responsibilities:
// - `state`: which application states are live and how control moves
//   between them
// - `command`: how transient intents reach the right subset of entities
//
// Notes:
// Both systems are synchronous. Neither mutates what it is iterating:
// stack changes wait in per-state queues, commands wait in the system
// queue until the next update.
//
//=========================================================================

pub mod command;
pub mod state;
