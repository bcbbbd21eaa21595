//! Application layer - Dispatch logic
//!
//! This layer contains:
//! - Errors: Error types shared by every layer
//! - Cooldown: Per-user, per-unit cooldown tracking
//! - Messaging: Command parsing, gates and dispatching
//! - Events: Listener binding and routing
//! - Tasks: Failure boundaries for handler execution

pub mod cooldown;
pub mod errors;
pub mod events;
pub mod messaging;
pub mod tasks;
