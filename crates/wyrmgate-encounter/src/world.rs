//! World interface consumed by the encounter subsystem.
//!
//! The wyrm and the orchestrator never touch chunk storage, entity
//! registries or networking directly. Everything they need from the
//! rest of the server flows through [`EncounterWorld`]: entity
//! enumeration, block edits, visual effects and reward delivery.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use wyrmgate_common::{BlockPos, DimensionId, EntityId};

/// Axis-aligned bounding box for contact checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Creates a new AABB from corners.
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates an AABB from center and half-extents.
    #[must_use]
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Returns the center of the AABB.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Checks if this AABB overlaps with another.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Checks if a point lies inside the AABB.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Expands the AABB by a margin on all sides.
    #[must_use]
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ONE)
    }
}

/// Snapshot of a player as seen by the encounter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// The player's entity ID
    pub id: EntityId,
    /// World-space position
    pub position: Vec3,
}

/// Snapshot of a ward pylon as seen by the encounter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PylonState {
    /// The pylon's entity ID
    pub id: EntityId,
    /// World-space position
    pub position: Vec3,
}

/// Block kinds the encounter reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlockKind {
    /// Empty space.
    #[default]
    Air,
    /// Arena floor material.
    RiftStone,
    /// Exit gate structure material.
    AnchorStone,
    /// Gateway portal frame.
    GatewayFrame,
    /// Ritual pad surface.
    PadStone,
    /// One-time victory trophy.
    Trophy,
}

/// Fire-and-forget effects handed to the world.
///
/// The receiving side owns the consequences (damage application,
/// particles, sounds); the encounter only declares that the effect
/// happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WorldEffect {
    // === Combat ===
    /// The wyrm's body struck a player.
    ContactAttack {
        /// Player that was hit
        target: EntityId,
        /// Damage to apply
        damage: f32,
    },
    /// A ranged bolt was launched.
    RangedBolt {
        /// Launch position
        origin: Vec3,
        /// Aim position
        target: Vec3,
    },
    /// Area burst at a dive impact point.
    ImpactBurst {
        /// Impact center
        center: Vec3,
        /// Blast radius
        radius: f32,
    },

    // === Support ===
    /// A pylon is channeling healing into the wyrm.
    HealBeam {
        /// Channeling pylon
        pylon: EntityId,
        /// Wyrm position being fed
        to: Vec3,
    },
}

/// World interface for the encounter subsystem.
pub trait EncounterWorld {
    /// Enumerates players currently in a dimension.
    fn players_in(&self, dimension: DimensionId) -> Vec<PlayerState>;
    /// Enumerates live ward pylons in a dimension.
    fn pylons_in(&self, dimension: DimensionId) -> Vec<PylonState>;
    /// Spawns a ward pylon, returning its entity ID.
    fn spawn_pylon(&mut self, dimension: DimensionId, position: Vec3) -> EntityId;
    /// Spawns the wyrm's world entity, returning its entity ID.
    fn spawn_wyrm_entity(&mut self, dimension: DimensionId, position: Vec3) -> EntityId;
    /// Removes an entity from the world.
    fn remove_entity(&mut self, id: EntityId);
    /// Syncs an entity's transform to the world.
    fn set_entity_transform(&mut self, id: EntityId, position: Vec3, yaw: f32, pitch: f32);
    /// Reads the block at a position.
    fn block(&self, pos: BlockPos) -> BlockKind;
    /// Writes the block at a position.
    fn set_block(&mut self, pos: BlockPos, kind: BlockKind);
    /// Emits a fire-and-forget effect.
    fn emit(&mut self, effect: WorldEffect);
    /// Grants reward points directly to a player.
    fn grant_points(&mut self, player: EntityId, amount: u64);
    /// Places collectible reward orbs worth `amount` points.
    fn place_reward_orbs(&mut self, position: Vec3, amount: u64);
}

/// Mock world for testing.
#[derive(Debug)]
pub struct MockEncounterWorld {
    /// Dimension all mock entities live in
    dimension: DimensionId,
    /// Players by entity ID
    players: Vec<PlayerState>,
    /// Live pylons by entity ID
    pylons: Vec<PylonState>,
    /// Block overrides (everything else is air)
    blocks: HashMap<BlockPos, BlockKind>,
    /// Recorded effects, in emission order
    pub effects: Vec<WorldEffect>,
    /// Recorded point grants
    pub grants: Vec<(EntityId, u64)>,
    /// Recorded orb placements
    pub orbs: Vec<(Vec3, u64)>,
    /// Recorded entity removals
    pub removed: Vec<EntityId>,
    /// Last synced transform per entity
    pub transforms: HashMap<EntityId, (Vec3, f32, f32)>,
    next_id: u64,
}

impl Default for MockEncounterWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEncounterWorld {
    /// Creates a mock world in the rift dimension.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dimension: DimensionId::RIFT,
            players: Vec::new(),
            pylons: Vec::new(),
            blocks: HashMap::new(),
            effects: Vec::new(),
            grants: Vec::new(),
            orbs: Vec::new(),
            removed: Vec::new(),
            transforms: HashMap::new(),
            next_id: 1000,
        }
    }

    /// Adds a player at a position, returning its entity ID.
    pub fn add_player(&mut self, position: Vec3) -> EntityId {
        let id = EntityId::from_raw(self.next_id);
        self.next_id += 1;
        self.players.push(PlayerState { id, position });
        id
    }

    /// Moves an existing player.
    pub fn move_player(&mut self, id: EntityId, position: Vec3) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
            player.position = position;
        }
    }

    /// Moves an existing pylon (for ritual placement in tests).
    pub fn move_pylon(&mut self, id: EntityId, position: Vec3) {
        if let Some(pylon) = self.pylons.iter_mut().find(|p| p.id == id) {
            pylon.position = position;
        }
    }

    /// Destroys a pylon, returning whether it was present.
    pub fn destroy_pylon(&mut self, id: EntityId) -> bool {
        let before = self.pylons.len();
        self.pylons.retain(|p| p.id != id);
        self.pylons.len() != before
    }

    /// Counts placed blocks of a kind.
    #[must_use]
    pub fn count_blocks(&self, kind: BlockKind) -> usize {
        self.blocks.values().filter(|&&k| k == kind).count()
    }

    /// Clears the recorded effect log.
    pub fn clear_effects(&mut self) {
        self.effects.clear();
    }
}

impl EncounterWorld for MockEncounterWorld {
    fn players_in(&self, dimension: DimensionId) -> Vec<PlayerState> {
        if dimension == self.dimension {
            self.players.clone()
        } else {
            Vec::new()
        }
    }

    fn pylons_in(&self, dimension: DimensionId) -> Vec<PylonState> {
        if dimension == self.dimension {
            self.pylons.clone()
        } else {
            Vec::new()
        }
    }

    fn spawn_pylon(&mut self, _dimension: DimensionId, position: Vec3) -> EntityId {
        let id = EntityId::from_raw(self.next_id);
        self.next_id += 1;
        self.pylons.push(PylonState { id, position });
        id
    }

    fn spawn_wyrm_entity(&mut self, _dimension: DimensionId, position: Vec3) -> EntityId {
        let id = EntityId::from_raw(self.next_id);
        self.next_id += 1;
        self.transforms.insert(id, (position, 0.0, 0.0));
        id
    }

    fn remove_entity(&mut self, id: EntityId) {
        self.players.retain(|p| p.id != id);
        self.pylons.retain(|p| p.id != id);
        self.transforms.remove(&id);
        self.removed.push(id);
    }

    fn set_entity_transform(&mut self, id: EntityId, position: Vec3, yaw: f32, pitch: f32) {
        self.transforms.insert(id, (position, yaw, pitch));
    }

    fn block(&self, pos: BlockPos) -> BlockKind {
        self.blocks.get(&pos).copied().unwrap_or_default()
    }

    fn set_block(&mut self, pos: BlockPos, kind: BlockKind) {
        if kind == BlockKind::Air {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, kind);
        }
    }

    fn emit(&mut self, effect: WorldEffect) {
        self.effects.push(effect);
    }

    fn grant_points(&mut self, player: EntityId, amount: u64) {
        self.grants.push((player, amount));
    }

    fn place_reward_orbs(&mut self, position: Vec3, amount: u64) {
        self.orbs.push((position, amount));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::from_center(Vec3::ZERO, Vec3::splat(1.0));
        let b = Aabb::from_center(Vec3::new(1.5, 0.0, 0.0), Vec3::splat(1.0));
        let c = Aabb::from_center(Vec3::new(5.0, 0.0, 0.0), Vec3::splat(1.0));

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_aabb_contains_and_expand() {
        let body = Aabb::from_center(Vec3::new(0.0, 70.0, 0.0), Vec3::new(3.0, 1.5, 3.0));
        assert!(body.contains(Vec3::new(2.0, 70.5, -2.0)));
        assert!(!body.contains(Vec3::new(3.2, 70.5, 0.0)));
        assert!(body.expanded(0.5).contains(Vec3::new(3.2, 70.5, 0.0)));
    }

    #[test]
    fn test_mock_world_dimension_scoping() {
        let mut world = MockEncounterWorld::new();
        world.add_player(Vec3::ZERO);
        assert_eq!(world.players_in(DimensionId::RIFT).len(), 1);
        assert!(world.players_in(DimensionId::OVERWORLD).is_empty());
    }

    #[test]
    fn test_mock_world_pylon_lifecycle() {
        let mut world = MockEncounterWorld::new();
        let id = world.spawn_pylon(DimensionId::RIFT, Vec3::new(10.0, 80.0, 0.0));
        assert_eq!(world.pylons_in(DimensionId::RIFT).len(), 1);
        assert!(world.destroy_pylon(id));
        assert!(!world.destroy_pylon(id));
        assert!(world.pylons_in(DimensionId::RIFT).is_empty());
    }

    #[test]
    fn test_mock_world_block_default_is_air() {
        let mut world = MockEncounterWorld::new();
        let pos = BlockPos::new(0, 64, 0);
        assert_eq!(world.block(pos), BlockKind::Air);
        world.set_block(pos, BlockKind::AnchorStone);
        assert_eq!(world.block(pos), BlockKind::AnchorStone);
        world.set_block(pos, BlockKind::Air);
        assert_eq!(world.block(pos), BlockKind::Air);
    }
}
