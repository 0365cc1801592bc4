//! Fixed geometry of the wyrm arena.
//!
//! All positions the encounter cares about derive from this layout:
//! the spire ring holding the ward pylons, the four ritual pads, the
//! exit gate the wyrm perches on, and the gateway slots carved after
//! each victory.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use wyrmgate_common::{BlockPos, DimensionId};

use crate::world::BlockKind;

/// Geometry of the arena in its host dimension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArenaLayout {
    /// Dimension hosting the arena.
    pub dimension: DimensionId,
    /// Top course of the arena floor, at the arena's center column.
    pub center: BlockPos,
    /// Ring radius of the pylon spires.
    pub spire_radius: f32,
    /// Pylon altitude above the floor surface.
    pub spire_height: f32,
    /// Ritual pad distance from the center, in blocks.
    pub pad_distance: i32,
    /// Height of the exit gate column, in blocks.
    pub exit_height: i32,
    /// Ring radius of the first gateway slot.
    pub gateway_base_radius: f32,
    /// Radius added per subsequent gateway slot.
    pub gateway_radius_step: f32,
    /// Number of angular gateway slots around the circle.
    pub gateway_slot_count: u32,
}

impl Default for ArenaLayout {
    fn default() -> Self {
        Self {
            dimension: DimensionId::RIFT,
            center: BlockPos::new(0, 63, 0),
            spire_radius: 36.0,
            spire_height: 18.0,
            pad_distance: 3,
            exit_height: 4,
            gateway_base_radius: 64.0,
            gateway_radius_step: 4.0,
            gateway_slot_count: 20,
        }
    }
}

impl ArenaLayout {
    /// Walkable floor surface height.
    #[must_use]
    pub fn ground_level(&self) -> f32 {
        (self.center.y + 1) as f32
    }

    /// World-space center of the arena at floor height.
    #[must_use]
    pub fn center_point(&self) -> Vec3 {
        let c = self.center.center();
        Vec3::new(c.x, self.ground_level(), c.z)
    }

    /// Where the wyrm lands while perching: the exit gate's top surface.
    #[must_use]
    pub fn perch_point(&self) -> Vec3 {
        let c = self.center.center();
        Vec3::new(c.x, (self.center.y + self.exit_height + 1) as f32, c.z)
    }

    /// Evenly spaced pylon positions atop the spire ring.
    #[must_use]
    pub fn spire_positions(&self, count: u32) -> Vec<Vec3> {
        let center = self.center_point();
        let y = self.ground_level() + self.spire_height;
        (0..count)
            .map(|i| {
                let angle = TAU * i as f32 / count.max(1) as f32;
                Vec3::new(
                    center.x + angle.cos() * self.spire_radius,
                    y,
                    center.z + angle.sin() * self.spire_radius,
                )
            })
            .collect()
    }

    /// Floor blocks of the four ritual pads (north, east, south, west).
    #[must_use]
    pub fn pad_blocks(&self) -> [BlockPos; 4] {
        let d = self.pad_distance;
        [
            self.center.offset(0, 0, -d),
            self.center.offset(d, 0, 0),
            self.center.offset(0, 0, d),
            self.center.offset(-d, 0, 0),
        ]
    }

    /// World-space pad positions a ritual pylon must stand at.
    #[must_use]
    pub fn ritual_pads(&self) -> [Vec3; 4] {
        self.pad_blocks().map(|block| {
            let c = block.center();
            Vec3::new(c.x, self.ground_level(), c.z)
        })
    }

    /// Block where the one-time trophy is placed.
    #[must_use]
    pub fn trophy_block(&self) -> BlockPos {
        self.center.offset(0, self.exit_height + 1, 0)
    }

    /// Gateway slot position for the given slot index.
    ///
    /// Slots sweep the circle angularly while stepping the radius
    /// outward, so no two slots collide.
    #[must_use]
    pub fn gateway_slot(&self, index: u32) -> BlockPos {
        let angle = TAU * index as f32 / self.gateway_slot_count.max(1) as f32;
        let radius = self.gateway_base_radius + self.gateway_radius_step * index as f32;
        let center = self.center_point();
        BlockPos::from_world(Vec3::new(
            center.x + angle.cos() * radius,
            self.ground_level(),
            center.z + angle.sin() * radius,
        ))
    }

    /// Block plan for one gateway: a two-block frame above the slot.
    #[must_use]
    pub fn gateway_blocks(&self, index: u32) -> [(BlockPos, BlockKind); 2] {
        let base = self.gateway_slot(index);
        [
            (base.up(), BlockKind::GatewayFrame),
            (base.up().up(), BlockKind::GatewayFrame),
        ]
    }

    /// Block plan for the exit gate: platform, column and ritual pads.
    ///
    /// Writing the same plan twice leaves the world unchanged.
    #[must_use]
    pub fn exit_gate_blocks(&self) -> Vec<(BlockPos, BlockKind)> {
        let mut plan = Vec::new();

        // 5x5 platform replacing the floor course around the center
        for dx in -2..=2 {
            for dz in -2..=2 {
                plan.push((self.center.offset(dx, 0, dz), BlockKind::AnchorStone));
            }
        }

        // Central column the wyrm perches on
        for dy in 1..=self.exit_height {
            plan.push((self.center.offset(0, dy, 0), BlockKind::AnchorStone));
        }

        // Ritual pads on the cardinal points
        for block in self.pad_blocks() {
            plan.push((block, BlockKind::PadStone));
        }

        plan
    }
}
