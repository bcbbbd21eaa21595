//! Message handling - Command parsing, gating and dispatching

pub mod dispatcher;
pub mod gates;
pub mod parser;

pub use dispatcher::CommandHandler;
pub use gates::{Dispatch, Rejection, MAINTENANCE_THROTTLE_SECS};
pub use parser::{parse_command, MessageParser, ParsedCommand};
