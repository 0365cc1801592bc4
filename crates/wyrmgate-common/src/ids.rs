//! ID types for entities and dimensions.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for entity IDs.
static ENTITY_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an entity in the game world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new unique entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(ENTITY_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates an entity ID from a raw value (for deserialization).
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) entity ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a world dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DimensionId(u16);

impl DimensionId {
    /// Creates a dimension ID from a raw value.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// The default overworld dimension.
    pub const OVERWORLD: Self = Self(0);

    /// The rift dimension hosting the wyrm arena.
    pub const RIFT: Self = Self(2);
}
