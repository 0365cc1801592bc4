//! Encounter persistence.
//!
//! Two records cross a server restart:
//! - the wyrm's combat state, so an interrupted fight resumes where
//!   it stopped
//! - the orchestrator's lifecycle state, including the permanent
//!   counters (completion flag, gateways carved)
//!
//! Both are framed binary: four magic bytes, a schema version, then a
//! bincode payload. Unknown phase tags inside a payload decode to a
//! safe default rather than failing the whole record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wyrmgate_common::{MagicBytes, SchemaVersion};

/// Frame header: magic bytes plus three version words.
const HEADER_LEN: usize = 10;

/// Errors that can occur while persisting encounter state.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid magic bytes
    #[error("invalid record format")]
    InvalidFormat,

    /// Version mismatch
    #[error("incompatible record version: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build writes
        expected: SchemaVersion,
        /// Version found in the record
        found: SchemaVersion,
    },

    /// Record corrupted
    #[error("record corrupted: {0}")]
    Corrupted(String),
}

/// Result type for persistence operations.
pub type SaveResult<T> = Result<T, SaveError>;

/// Persistable wyrm combat state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WyrmSaveData {
    /// Behavior phase tag
    pub phase: u8,
    /// Seconds spent in that phase
    pub phase_elapsed: f32,
    /// World-space position
    pub position: [f32; 3],
    /// World-space velocity
    pub velocity: [f32; 3],
    /// Facing yaw in radians
    pub yaw: f32,
    /// Facing pitch in radians
    pub pitch: f32,
    /// Remaining health
    pub health: f32,
    /// Destroyed-pylon count driving resistance
    pub pylons_destroyed: u32,
    /// Ticks lived, for attack-window bookkeeping
    pub tick_count: u64,
}

impl WyrmSaveData {
    /// Serializes to the framed binary format.
    pub fn to_bytes(&self) -> SaveResult<Vec<u8>> {
        encode_record(MagicBytes::WYRM, SchemaVersion::WYRM_STATE, self)
    }

    /// Deserializes from the framed binary format.
    pub fn from_bytes(bytes: &[u8]) -> SaveResult<Self> {
        decode_record(MagicBytes::WYRM, SchemaVersion::WYRM_STATE, bytes)
    }
}

/// Persistable orchestrator state.
///
/// Tracked pylon entities are deliberately absent; they are
/// re-resolved against the world after a restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncounterSaveData {
    /// Lifecycle phase tag
    pub phase: u8,
    /// Seconds spent in that phase
    pub phase_elapsed: f32,
    /// Seconds left on the respawn countdown, if armed
    pub respawn_countdown: Option<f32>,
    /// Total pylons destroyed across all encounters
    pub pylons_destroyed: u32,
    /// Whether any encounter has ever been won
    pub completed_before: bool,
    /// Whether the next reset still owes the first-victory trophy
    pub first_completion: bool,
    /// Gateways carved so far
    pub gateways_created: u32,
    /// Wyrm state, when a fight was in progress
    pub wyrm: Option<WyrmSaveData>,
}

impl EncounterSaveData {
    /// Serializes to the framed binary format.
    pub fn to_bytes(&self) -> SaveResult<Vec<u8>> {
        encode_record(MagicBytes::ENCOUNTER, SchemaVersion::ENCOUNTER_STATE, self)
    }

    /// Deserializes from the framed binary format.
    pub fn from_bytes(bytes: &[u8]) -> SaveResult<Self> {
        decode_record(MagicBytes::ENCOUNTER, SchemaVersion::ENCOUNTER_STATE, bytes)
    }
}

fn encode_record<T: Serialize>(
    magic: MagicBytes,
    version: SchemaVersion,
    record: &T,
) -> SaveResult<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(&magic.0);
    buffer.extend_from_slice(&version.major.to_le_bytes());
    buffer.extend_from_slice(&version.minor.to_le_bytes());
    buffer.extend_from_slice(&version.patch.to_le_bytes());
    let payload =
        bincode::serialize(record).map_err(|e| SaveError::Serialization(e.to_string()))?;
    buffer.extend(payload);
    Ok(buffer)
}

fn decode_record<T: DeserializeOwned>(
    magic: MagicBytes,
    current: SchemaVersion,
    bytes: &[u8],
) -> SaveResult<T> {
    if bytes.len() < HEADER_LEN || bytes[0..4] != magic.0 {
        return Err(SaveError::InvalidFormat);
    }
    let found = SchemaVersion::new(
        u16::from_le_bytes([bytes[4], bytes[5]]),
        u16::from_le_bytes([bytes[6], bytes[7]]),
        u16::from_le_bytes([bytes[8], bytes[9]]),
    );
    if !current.can_read(&found) {
        return Err(SaveError::VersionMismatch {
            expected: current,
            found,
        });
    }
    bincode::deserialize(&bytes[HEADER_LEN..]).map_err(|e| SaveError::Corrupted(e.to_string()))
}
