//! Version types for schema compatibility.

use serde::{Deserialize, Serialize};

/// Schema version using semantic versioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version (breaking changes)
    pub major: u16,
    /// Minor version (backwards-compatible additions)
    pub minor: u16,
    /// Patch version (bug fixes)
    pub patch: u16,
}

impl SchemaVersion {
    /// Creates a new schema version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Current wyrm state record version.
    pub const WYRM_STATE: Self = Self::new(1, 0, 0);

    /// Current encounter state record version.
    pub const ENCOUNTER_STATE: Self = Self::new(1, 0, 0);

    /// Checks if this version is compatible with another version.
    /// Compatible means same major version and this minor >= other minor.
    #[must_use]
    pub const fn is_compatible_with(&self, other: &Self) -> bool {
        self.major == other.major && self.minor >= other.minor
    }

    /// Checks if this version can read data from another version.
    #[must_use]
    pub const fn can_read(&self, data_version: &Self) -> bool {
        self.major == data_version.major
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Magic bytes for persisted record identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicBytes(pub [u8; 4]);

impl MagicBytes {
    /// Wyrm state record magic bytes.
    pub const WYRM: Self = Self(*b"WGWY");

    /// Encounter state record magic bytes.
    pub const ENCOUNTER: Self = Self(*b"WGEC");
}
