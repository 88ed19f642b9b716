//=========================================================================
// Command System
//=========================================================================
//
// Mask-filtered, single-tick dispatch of effects to entities.
//
// Architecture:
//   Producers (input bindings, scripts, AI)
//     └─ Command { dispatch mask, effect }
//          ↓ queue_command() / CommandSender
//   CommandSystem
//     └─ update(dt): entity type mask & dispatch mask != 0 → execute
//
// Flow:
//   queue → dispatch against CommandComponent entities → clear
//
//=========================================================================

//=== Module Declarations =================================================

mod bindings;
#[allow(clippy::module_inception)]
mod command;
mod command_system;
mod component;
mod mask;

//=== Public API ==========================================================

pub use bindings::{CommandBindings, InputKind};
pub use command::{Command, CommandEffect};
pub use command_system::{CommandError, CommandSender, CommandSystem};
pub use component::{CommandComponent, Entity, TypeMaskTable};
pub use mask::Mask;
