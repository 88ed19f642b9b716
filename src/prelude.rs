//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use tantech_core::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Driver
pub use crate::driver::{execute_stack, Driver, DriverBuilder, TickControl};

// State system
pub use crate::core::state::{
    GameState, PopPolicy, StackError, StateContext, StateHandle, StateStack,
    StateStackBuilder,
};

// Command system
pub use crate::core::command::{
    Command, CommandBindings, CommandComponent, CommandEffect, CommandSender, CommandSystem,
    Entity, InputKind, Mask, TypeMaskTable,
};
