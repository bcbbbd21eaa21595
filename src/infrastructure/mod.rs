//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Plugins: Manifest discovery, handler table and the unit registry
//! - Adapters: Transport integrations (console)

pub mod config;
pub mod plugins;
pub mod adapters;
