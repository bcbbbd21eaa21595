//! Domain layer - Units and transport abstractions
//!
//! This layer contains:
//! - Entities: messages, interactions, events and the three unit variants
//! - Traits: the transport client boundary (Bot)
//! - Rules: construction-time validation of units

pub mod entities;
pub mod traits;
