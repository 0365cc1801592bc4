//! Coordinate types for block and world positions.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Integer block position in world space (Y is up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct BlockPos {
    /// X coordinate in block space
    pub x: i32,
    /// Y coordinate in block space (vertical)
    pub y: i32,
    /// Z coordinate in block space
    pub z: i32,
}

impl BlockPos {
    /// Creates a new block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The world origin.
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Returns this position offset by the given deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Returns the position directly above this one.
    #[must_use]
    pub const fn up(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// Converts to the world-space center of the block.
    #[must_use]
    pub fn center(self) -> Vec3 {
        Vec3::new(
            self.x as f32 + 0.5,
            self.y as f32 + 0.5,
            self.z as f32 + 0.5,
        )
    }

    /// Creates the block position containing a world-space point.
    #[must_use]
    pub fn from_world(point: Vec3) -> Self {
        Self::new(
            point.x.floor() as i32,
            point.y.floor() as i32,
            point.z.floor() as i32,
        )
    }

    /// Squared horizontal (XZ-plane) distance to another position.
    #[must_use]
    pub const fn horizontal_distance_sq(self, other: Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }
}
