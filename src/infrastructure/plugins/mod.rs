//! Plugin system for botbase
//!
//! Units are described by YAML manifests in the configured directories.
//! Each manifest names a handler from the compiled `HandlerTable`; the
//! loader validates the manifest and the registry indexes the result.

pub mod handlers;
pub mod loader;
pub mod manifest;
pub mod registry;

pub use handlers::HandlerTable;
pub use loader::{LoadedUnit, UnitLoader, PLUGIN_FILE_PATTERN};
pub use manifest::Manifest;
pub use registry::{sort_listeners, CategoryEntry, Registry};
