//! botbase - command and event dispatch core for chat bots
//!
//! Units (message commands, slash commands, event listeners) are declared
//! in YAML manifests and bound to handlers compiled into the binary.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::events::EventHandler;
pub use application::messaging::{CommandHandler, Dispatch, Rejection};
pub use infrastructure::config::Config;
pub use infrastructure::plugins::HandlerTable;
