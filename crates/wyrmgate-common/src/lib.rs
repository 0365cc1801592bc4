//! # Wyrmgate Common
//!
//! Common types, utilities, and shared abstractions for Project Wyrmgate.
//!
//! This crate provides foundational types used across all Wyrmgate subsystems:
//! - Coordinate types (block positions, world-space conversions)
//! - ID types (EntityId, DimensionId)
//! - Version information for persisted schemas
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;
