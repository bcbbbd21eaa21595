//! Event handling - category bindings and listener routing

pub mod handler;
pub mod router;

pub use handler::EventHandler;
pub use router::{route, RouteOutcome};
