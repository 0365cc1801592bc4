//! Encounter orchestrator: owns the wyrm's lifecycle end to end.
//!
//! The manager runs a five-phase cycle:
//! - `Waiting`: arena idle; first visit or a completed respawn ritual
//!   starts the next fight
//! - `Preparing`: ward pylons raised, wyrm spawns when the dwell ends
//! - `Active`: the fight; wyrm ticked, notifications drained
//! - `Victory`: rewards are out, short ceremony dwell
//! - `Reset`: permanent world mutations (exit gate, one-time trophy,
//!   capped gateway), then straight back to `Waiting`
//!
//! The cycle order never varies and each phase has exactly one
//! successor. The manager is the single writer of the pylon set and
//! the destroyed-pylon count; the wyrm receives the count, it never
//! reads the world for it.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use wyrmgate_common::EntityId;

use crate::arena::ArenaLayout;
use crate::config::{EncounterConfig, WyrmConfig};
use crate::events::{EncounterEvent, EventBus};
use crate::fsm::PhaseClock;
use crate::rng::EncounterRng;
use crate::save::{EncounterSaveData, WyrmSaveData};
use crate::world::{BlockKind, EncounterWorld, PylonState};
use crate::wyrm::{Wyrm, WyrmNotification};

/// Lifecycle phases of the encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncounterPhase {
    /// Arena idle, watching for a start trigger.
    Waiting,
    /// Pylons raised, wyrm incoming.
    Preparing,
    /// The fight is on.
    Active,
    /// The wyrm has fallen; ceremony dwell.
    Victory,
    /// Permanent mutations, then back to waiting.
    Reset,
}

impl EncounterPhase {
    /// Get the display name for this phase.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Preparing => "Preparing",
            Self::Active => "Active",
            Self::Victory => "Victory",
            Self::Reset => "Reset",
        }
    }

    /// Whether the pylon set may be non-empty in this phase.
    #[must_use]
    pub const fn holds_pylons(self) -> bool {
        matches!(self, Self::Preparing | Self::Active)
    }

    /// Stable tag for persistence.
    #[must_use]
    pub const fn as_raw(self) -> u8 {
        match self {
            Self::Waiting => 0,
            Self::Preparing => 1,
            Self::Active => 2,
            Self::Victory => 3,
            Self::Reset => 4,
        }
    }

    /// Decodes a persisted tag. Unknown tags fall back to `Waiting`.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Waiting,
            1 => Self::Preparing,
            2 => Self::Active,
            3 => Self::Victory,
            4 => Self::Reset,
            _ => Self::Waiting,
        }
    }
}

/// Orchestrates the boss encounter in its arena dimension.
#[derive(Debug)]
pub struct EncounterManager {
    config: EncounterConfig,
    wyrm_config: WyrmConfig,
    arena: ArenaLayout,
    clock: PhaseClock<EncounterPhase>,
    bus: EventBus,
    respawn_countdown: Option<f32>,
    pylons: Vec<EntityId>,
    pylons_destroyed: u32,
    completed_before: bool,
    first_completion: bool,
    gateways_created: u32,
    participants: Vec<EntityId>,
    wyrm: Option<Wyrm>,
    // restore bookkeeping, consumed on the first tick with a world
    restore_sync: bool,
    pending_wyrm: Option<WyrmSaveData>,
}

impl EncounterManager {
    /// Creates an idle manager for a fresh world.
    #[must_use]
    pub fn new(config: EncounterConfig, wyrm_config: WyrmConfig, arena: ArenaLayout) -> Self {
        Self {
            config,
            wyrm_config,
            arena,
            clock: PhaseClock::new(EncounterPhase::Waiting),
            bus: EventBus::default(),
            respawn_countdown: None,
            pylons: Vec::new(),
            pylons_destroyed: 0,
            completed_before: false,
            first_completion: false,
            gateways_created: 0,
            participants: Vec::new(),
            wyrm: None,
            restore_sync: false,
            pending_wyrm: None,
        }
    }

    /// Restores a manager from a persisted record.
    ///
    /// World-side pieces (wyrm entity, tracked pylons) are re-resolved
    /// against the world on the first tick.
    #[must_use]
    pub fn restore(
        config: EncounterConfig,
        wyrm_config: WyrmConfig,
        arena: ArenaLayout,
        data: &EncounterSaveData,
    ) -> Self {
        let mut manager = Self::new(config, wyrm_config, arena);
        manager.clock = PhaseClock::restore(
            EncounterPhase::from_raw(data.phase),
            data.phase_elapsed,
        );
        manager.respawn_countdown = data.respawn_countdown;
        manager.pylons_destroyed = data.pylons_destroyed;
        manager.completed_before = data.completed_before;
        manager.first_completion = data.first_completion;
        manager.gateways_created = data.gateways_created;
        manager.pending_wyrm = data.wyrm.clone();
        manager.restore_sync = true;
        manager
    }

    /// Captures the persistable state of the encounter.
    #[must_use]
    pub fn snapshot(&self) -> EncounterSaveData {
        EncounterSaveData {
            phase: self.clock.phase().as_raw(),
            phase_elapsed: self.clock.elapsed(),
            respawn_countdown: self.respawn_countdown,
            pylons_destroyed: self.pylons_destroyed,
            completed_before: self.completed_before,
            first_completion: self.first_completion,
            gateways_created: self.gateways_created,
            wyrm: self.wyrm.as_ref().map(Wyrm::snapshot),
        }
    }

    // === Accessors ===

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> EncounterPhase {
        self.clock.phase()
    }

    /// Seconds spent in the current phase.
    #[must_use]
    pub const fn phase_elapsed(&self) -> f32 {
        self.clock.elapsed()
    }

    /// Total pylons destroyed; never decreases, even across encounters.
    #[must_use]
    pub const fn pylons_destroyed(&self) -> u32 {
        self.pylons_destroyed
    }

    /// Whether any encounter has ever been won in this world.
    #[must_use]
    pub const fn completed_before(&self) -> bool {
        self.completed_before
    }

    /// Gateways carved so far (capped).
    #[must_use]
    pub const fn gateways_created(&self) -> u32 {
        self.gateways_created
    }

    /// Seconds left on the respawn countdown, if one is running.
    #[must_use]
    pub const fn respawn_countdown(&self) -> Option<f32> {
        self.respawn_countdown
    }

    /// Players counted as participants this tick.
    #[must_use]
    pub fn participants(&self) -> &[EntityId] {
        &self.participants
    }

    /// Entity IDs of the tracked ward pylons.
    #[must_use]
    pub fn tracked_pylons(&self) -> &[EntityId] {
        &self.pylons
    }

    /// The live wyrm, if the fight is on.
    #[must_use]
    pub fn wyrm(&self) -> Option<&Wyrm> {
        self.wyrm.as_ref()
    }

    /// Mutable access to the live wyrm, for damage routing.
    pub fn wyrm_mut(&mut self) -> Option<&mut Wyrm> {
        self.wyrm.as_mut()
    }

    /// The event bus this encounter publishes on.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.bus
    }

    // === External notifications ===

    /// Records the destruction of a ward pylon.
    ///
    /// Unknown IDs are ignored, so duplicate notices count once. The
    /// new total is pushed into the wyrm immediately.
    pub fn notify_pylon_destroyed(&mut self, pylon: EntityId) {
        let Some(index) = self.pylons.iter().position(|&p| p == pylon) else {
            warn!("destruction notice for untracked pylon {:?}", pylon);
            return;
        };
        self.pylons.swap_remove(index);
        self.pylons_destroyed += 1;
        if let Some(wyrm) = self.wyrm.as_mut() {
            wyrm.set_pylons_destroyed(self.pylons_destroyed);
        }
        self.bus.publish(EncounterEvent::PylonDestroyed {
            pylon,
            destroyed_count: self.pylons_destroyed,
        });
        info!("ward pylon destroyed ({} total)", self.pylons_destroyed);
    }

    // === Tick pipeline ===

    /// Advances the encounter by one tick.
    pub fn tick<W: EncounterWorld>(&mut self, dt: f32, world: &mut W, rng: &mut EncounterRng) {
        if self.restore_sync {
            self.finish_restore(world);
        }

        self.clock.advance(dt);
        self.participants = world
            .players_in(self.arena.dimension)
            .iter()
            .map(|p| p.id)
            .collect();

        if let Some(remaining) = self.respawn_countdown {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                self.respawn_countdown = None;
                self.enter_preparing(world);
                return;
            }
            self.respawn_countdown = Some(remaining);
        }

        match self.clock.phase() {
            EncounterPhase::Waiting => self.tick_waiting(world),
            EncounterPhase::Preparing => self.tick_preparing(world),
            EncounterPhase::Active => self.tick_active(dt, world, rng),
            EncounterPhase::Victory => self.tick_victory(world),
            EncounterPhase::Reset => {
                // entry actions ran when the phase was entered
                self.transition_to(EncounterPhase::Waiting);
            },
        }
    }

    /// Re-resolves world-side pieces after a restore.
    fn finish_restore<W: EncounterWorld>(&mut self, world: &mut W) {
        self.restore_sync = false;
        if self.clock.phase().holds_pylons() && self.pylons.is_empty() {
            self.pylons = world
                .pylons_in(self.arena.dimension)
                .iter()
                .map(|p| p.id)
                .collect();
            debug!("re-tracked {} ward pylons after restore", self.pylons.len());
        }
        if let Some(data) = self.pending_wyrm.take() {
            let position = Vec3::from_array(data.position);
            let entity = world.spawn_wyrm_entity(self.arena.dimension, position);
            let mut wyrm = Wyrm::restore(entity, self.wyrm_config.clone(), self.arena, &data);
            wyrm.set_event_sender(self.bus.sender());
            self.wyrm = Some(wyrm);
            info!("wyrm restored mid-encounter at {:?}", position);
        }
    }

    fn tick_waiting<W: EncounterWorld>(&mut self, world: &mut W) {
        if !self.completed_before {
            // first visit: any player in the dimension starts the fight
            if !self.participants.is_empty() {
                self.enter_preparing(world);
            }
            return;
        }

        if self.respawn_countdown.is_some() {
            return;
        }

        let pylons = world.pylons_in(self.arena.dimension);
        if let Some(ritual) = self.match_ritual(&pylons) {
            for id in ritual {
                world.remove_entity(id);
            }
            self.respawn_countdown = Some(self.config.respawn_countdown);
            info!(
                "respawn ritual completed, encounter starts in {:.0}s",
                self.config.respawn_countdown
            );
        }
    }

    /// Four distinct pylons on the four pads, or nothing.
    fn match_ritual(&self, pylons: &[PylonState]) -> Option<[EntityId; 4]> {
        let pads = self.arena.ritual_pads();
        let mut matched = [EntityId::NULL; 4];
        let mut count = 0;
        'pads: for pad in pads {
            for pylon in pylons {
                if matched[..count].contains(&pylon.id) {
                    continue;
                }
                if pylon.position.distance(pad) <= self.config.ritual_pad_radius {
                    matched[count] = pylon.id;
                    count += 1;
                    continue 'pads;
                }
            }
            // an unoccupied pad leaves every placed pylon untouched
            return None;
        }
        Some(matched)
    }

    fn enter_preparing<W: EncounterWorld>(&mut self, world: &mut W) {
        self.transition_to(EncounterPhase::Preparing);
        for id in self.pylons.drain(..) {
            world.remove_entity(id);
        }
        self.pylons = self
            .arena
            .spire_positions(self.config.pylon_count)
            .into_iter()
            .map(|position| world.spawn_pylon(self.arena.dimension, position))
            .collect();
        info!("encounter preparing: {} ward pylons raised", self.pylons.len());
    }

    fn tick_preparing<W: EncounterWorld>(&mut self, world: &mut W) {
        if self.clock.elapsed() >= self.config.preparing_dwell {
            self.spawn_wyrm(world);
            self.transition_to(EncounterPhase::Active);
        }
    }

    fn spawn_wyrm<W: EncounterWorld>(&mut self, world: &mut W) {
        let spawn = self.arena.center_point()
            + Vec3::new(0.0, self.wyrm_config.circling_height, 0.0);
        let entity = world.spawn_wyrm_entity(self.arena.dimension, spawn);
        let mut wyrm = Wyrm::new(
            entity,
            self.wyrm_config.clone(),
            self.arena,
            self.pylons_destroyed,
            spawn,
        );
        wyrm.set_event_sender(self.bus.sender());
        info!(
            "wyrm {:?} enters the arena at resistance {:.2}",
            entity,
            wyrm.resistance()
        );
        self.wyrm = Some(wyrm);
    }

    fn tick_active<W: EncounterWorld>(&mut self, dt: f32, world: &mut W, rng: &mut EncounterRng) {
        let mut died = false;
        if let Some(wyrm) = self.wyrm.as_mut() {
            wyrm.tick(dt, world, rng);
            for note in wyrm.drain_notifications() {
                match note {
                    WyrmNotification::PhaseChanged { from, to } => {
                        self.bus.publish(EncounterEvent::WyrmPhaseChanged { from, to });
                    },
                    WyrmNotification::Damaged {
                        remaining_health,
                        applied,
                        source,
                    } => {
                        self.bus.publish(EncounterEvent::WyrmDamaged {
                            remaining_health,
                            applied,
                            source,
                        });
                    },
                    WyrmNotification::Died => died = true,
                }
            }
        } else {
            debug!("active encounter without a wyrm agent; nothing to tick");
        }

        if died {
            self.complete_victory(world);
        }
    }

    fn complete_victory<W: EncounterWorld>(&mut self, world: &mut W) {
        self.first_completion = !self.completed_before;
        self.completed_before = true;
        self.distribute_rewards(world);
        if let Some(wyrm) = self.wyrm.take() {
            world.remove_entity(wyrm.entity());
        }
        // surviving wards shatter with their master
        for id in self.pylons.drain(..) {
            world.remove_entity(id);
        }
        self.bus.publish(EncounterEvent::WyrmDied);
        self.transition_to(EncounterPhase::Victory);
        info!("the wyrm has fallen");
    }

    /// Splits the pool between participants; the integer remainder is
    /// placed as collectible orbs so no points evaporate.
    fn distribute_rewards<W: EncounterWorld>(&mut self, world: &mut W) {
        let pool = self.config.reward_pool;
        let center = self.arena.center_point();
        let count = self.participants.len() as u64;

        if count == 0 {
            warn!("victory with no participants; placing the full pool as orbs");
            world.place_reward_orbs(center, pool);
            self.bus.publish(EncounterEvent::RewardsDistributed {
                participants: 0,
                granted: 0,
                placed_as_orbs: pool,
            });
            return;
        }

        let share = pool / count;
        let per_player = share.max(self.config.reward_minimum);
        for id in &self.participants {
            world.grant_points(*id, per_player);
        }
        let granted = per_player * count;
        let remainder = pool.saturating_sub(granted);
        if remainder > 0 {
            world.place_reward_orbs(center, remainder);
        }
        self.bus.publish(EncounterEvent::RewardsDistributed {
            participants: count as u32,
            granted,
            placed_as_orbs: remainder,
        });
        info!(
            "rewards out: {} points to {} players, {} as orbs",
            granted, count, remainder
        );
    }

    fn tick_victory<W: EncounterWorld>(&mut self, world: &mut W) {
        if self.clock.elapsed() >= self.config.victory_dwell {
            self.enter_reset(world);
        }
    }

    /// Permanent world mutations, all within the tick entering Reset.
    fn enter_reset<W: EncounterWorld>(&mut self, world: &mut W) {
        self.transition_to(EncounterPhase::Reset);

        // the exit gate plan is idempotent: rewriting it changes nothing
        for (pos, kind) in self.arena.exit_gate_blocks() {
            world.set_block(pos, kind);
        }

        if self.first_completion {
            self.first_completion = false;
            world.set_block(self.arena.trophy_block(), BlockKind::Trophy);
            info!("first victory: trophy placed");
        }

        if self.gateways_created < self.config.gateway_cap {
            let slot = self.gateways_created;
            for (pos, kind) in self.arena.gateway_blocks(slot) {
                world.set_block(pos, kind);
            }
            self.gateways_created += 1;
            info!(
                "gateway {} of {} carved",
                self.gateways_created, self.config.gateway_cap
            );
        }
    }

    // === Transitions ===

    fn transition_to(&mut self, next: EncounterPhase) {
        if self.clock.phase() == next {
            return;
        }
        let (from, to) = self.clock.set(next);
        debug!(
            "encounter phase {} -> {}",
            from.display_name(),
            to.display_name()
        );
        self.bus
            .publish(EncounterEvent::EncounterPhaseChanged { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::MockEncounterWorld;
    use proptest::prelude::*;
    use wyrmgate_common::DimensionId;

    const DT: f32 = 0.05;

    fn fast_config() -> EncounterConfig {
        EncounterConfig {
            preparing_dwell: 0.2,
            victory_dwell: 0.2,
            respawn_countdown: 0.3,
            ..EncounterConfig::default()
        }
    }

    fn manager() -> EncounterManager {
        EncounterManager::new(
            fast_config(),
            WyrmConfig::default(),
            ArenaLayout::default(),
        )
    }

    fn tick_n(
        m: &mut EncounterManager,
        world: &mut MockEncounterWorld,
        rng: &mut EncounterRng,
        n: usize,
    ) {
        for _ in 0..n {
            m.tick(DT, world, rng);
        }
    }

    #[test]
    fn test_first_visit_starts_encounter() {
        let mut m = manager();
        let mut world = MockEncounterWorld::new();
        let mut rng = EncounterRng::new(1);

        m.tick(DT, &mut world, &mut rng);
        assert_eq!(m.phase(), EncounterPhase::Waiting);

        world.add_player(Vec3::new(0.0, 64.0, 0.0));
        m.tick(DT, &mut world, &mut rng);
        assert_eq!(m.phase(), EncounterPhase::Preparing);
        assert_eq!(m.tracked_pylons().len(), 10);
        assert_eq!(world.pylons_in(DimensionId::RIFT).len(), 10);
    }

    #[test]
    fn test_wyrm_spawns_after_preparing_dwell() {
        let mut m = manager();
        let mut world = MockEncounterWorld::new();
        let mut rng = EncounterRng::new(1);
        world.add_player(Vec3::new(0.0, 64.0, 0.0));

        tick_n(&mut m, &mut world, &mut rng, 10);
        assert_eq!(m.phase(), EncounterPhase::Active);
        let wyrm = m.wyrm().map(|w| w.entity());
        assert!(wyrm.is_some());
        assert!((m.wyrm().map_or(0.0, Wyrm::resistance) - 0.5).abs() < 1e-6);
    }

    fn drive_to_active(
        m: &mut EncounterManager,
        world: &mut MockEncounterWorld,
        rng: &mut EncounterRng,
    ) {
        world.add_player(Vec3::new(0.0, 64.0, 0.0));
        for _ in 0..100 {
            m.tick(DT, world, rng);
            if m.phase() == EncounterPhase::Active {
                return;
            }
        }
        panic!("never reached the active phase");
    }

    fn slay_wyrm(
        m: &mut EncounterManager,
        world: &mut MockEncounterWorld,
        rng: &mut EncounterRng,
    ) {
        for id in m.tracked_pylons().to_vec() {
            world.destroy_pylon(id);
            m.notify_pylon_destroyed(id);
        }
        if let Some(wyrm) = m.wyrm_mut() {
            wyrm.apply_damage(10_000.0, None);
        }
        // descent + settle + victory dwell
        for _ in 0..4000 {
            m.tick(DT, world, rng);
            if m.phase() == EncounterPhase::Waiting && m.completed_before() {
                return;
            }
        }
        panic!("cycle never returned to waiting");
    }

    #[test]
    fn test_full_cycle_phase_order() {
        let mut m = manager();
        let mut world = MockEncounterWorld::new();
        let mut rng = EncounterRng::new(2);

        drive_to_active(&mut m, &mut world, &mut rng);
        slay_wyrm(&mut m, &mut world, &mut rng);

        let order: Vec<(EncounterPhase, EncounterPhase)> = m
            .events()
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                EncounterEvent::EncounterPhaseChanged { from, to } => Some((from, to)),
                _ => None,
            })
            .collect();
        assert_eq!(
            order,
            vec![
                (EncounterPhase::Waiting, EncounterPhase::Preparing),
                (EncounterPhase::Preparing, EncounterPhase::Active),
                (EncounterPhase::Active, EncounterPhase::Victory),
                (EncounterPhase::Victory, EncounterPhase::Reset),
                (EncounterPhase::Reset, EncounterPhase::Waiting),
            ]
        );
    }

    #[test]
    fn test_victory_removes_wyrm_and_pylons() {
        let mut m = manager();
        let mut world = MockEncounterWorld::new();
        let mut rng = EncounterRng::new(3);

        drive_to_active(&mut m, &mut world, &mut rng);
        let wyrm_entity = m.wyrm().map(Wyrm::entity);
        slay_wyrm(&mut m, &mut world, &mut rng);

        assert!(m.wyrm().is_none());
        assert!(m.tracked_pylons().is_empty());
        assert!(world.pylons_in(DimensionId::RIFT).is_empty());
        if let Some(entity) = wyrm_entity {
            assert!(world.removed.contains(&entity));
        }
    }

    #[test]
    fn test_pylon_destruction_counts_once_and_reaches_wyrm() {
        let mut m = manager();
        let mut world = MockEncounterWorld::new();
        let mut rng = EncounterRng::new(4);
        drive_to_active(&mut m, &mut world, &mut rng);

        let id = m.tracked_pylons()[0];
        world.destroy_pylon(id);
        m.notify_pylon_destroyed(id);
        assert_eq!(m.pylons_destroyed(), 1);
        assert!((m.wyrm().map_or(0.0, Wyrm::resistance) - 0.45).abs() < 1e-6);

        // duplicate notice: untracked id, ignored
        m.notify_pylon_destroyed(id);
        assert_eq!(m.pylons_destroyed(), 1);
    }

    #[test]
    fn test_ritual_four_distinct_consumes_and_counts_down() {
        let arena = ArenaLayout::default();
        let data = EncounterSaveData {
            phase: EncounterPhase::Waiting.as_raw(),
            phase_elapsed: 0.0,
            respawn_countdown: None,
            pylons_destroyed: 0,
            completed_before: true,
            first_completion: false,
            gateways_created: 1,
            wyrm: None,
        };
        let mut m =
            EncounterManager::restore(fast_config(), WyrmConfig::default(), arena, &data);
        let mut world = MockEncounterWorld::new();
        let mut rng = EncounterRng::new(5);

        for pad in arena.ritual_pads() {
            world.spawn_pylon(DimensionId::RIFT, pad);
        }
        m.tick(DT, &mut world, &mut rng);
        assert!(m.respawn_countdown().is_some());
        assert!(world.pylons_in(DimensionId::RIFT).is_empty());

        // countdown rolls into a fresh encounter
        for _ in 0..10 {
            m.tick(DT, &mut world, &mut rng);
            if m.phase() != EncounterPhase::Waiting {
                break;
            }
        }
        assert_eq!(m.phase(), EncounterPhase::Preparing);
    }

    #[test]
    fn test_partial_ritual_is_ignored() {
        let arena = ArenaLayout::default();
        let data = EncounterSaveData {
            phase: EncounterPhase::Waiting.as_raw(),
            phase_elapsed: 0.0,
            respawn_countdown: None,
            pylons_destroyed: 0,
            completed_before: true,
            first_completion: false,
            gateways_created: 0,
            wyrm: None,
        };
        let mut m =
            EncounterManager::restore(fast_config(), WyrmConfig::default(), arena, &data);
        let mut world = MockEncounterWorld::new();
        let mut rng = EncounterRng::new(6);

        let pads = arena.ritual_pads();
        for pad in pads.iter().take(3) {
            world.spawn_pylon(DimensionId::RIFT, *pad);
        }
        // a fourth pylon crowding an occupied pad does not complete the set
        world.spawn_pylon(DimensionId::RIFT, pads[0] + Vec3::new(0.5, 0.0, 0.0));

        tick_n(&mut m, &mut world, &mut rng, 20);
        assert!(m.respawn_countdown().is_none());
        assert_eq!(m.phase(), EncounterPhase::Waiting);
        assert_eq!(world.pylons_in(DimensionId::RIFT).len(), 4);
    }

    #[test]
    fn test_ritual_tracks_live_pylon_positions() {
        let arena = ArenaLayout::default();
        let data = EncounterSaveData {
            phase: EncounterPhase::Waiting.as_raw(),
            phase_elapsed: 0.0,
            respawn_countdown: None,
            pylons_destroyed: 0,
            completed_before: true,
            first_completion: false,
            gateways_created: 0,
            wyrm: None,
        };
        let mut m =
            EncounterManager::restore(fast_config(), WyrmConfig::default(), arena, &data);
        let mut world = MockEncounterWorld::new();
        let mut rng = EncounterRng::new(8);

        let pads = arena.ritual_pads();
        let carriers: Vec<EntityId> = pads
            .iter()
            .map(|pad| world.spawn_pylon(DimensionId::RIFT, *pad + Vec3::new(12.0, 0.0, 0.0)))
            .collect();
        tick_n(&mut m, &mut world, &mut rng, 5);
        assert!(m.respawn_countdown().is_none());

        // the scan reads fresh positions every tick: pylons carried onto
        // their pads complete the set without respawning them
        for (id, pad) in carriers.iter().zip(pads.iter()) {
            world.move_pylon(*id, *pad);
        }
        m.tick(DT, &mut world, &mut rng);
        assert!(m.respawn_countdown().is_some());
        assert!(world.pylons_in(DimensionId::RIFT).is_empty());
    }

    #[test]
    fn test_destroyed_count_persists_into_next_encounter() {
        let mut m = manager();
        let mut world = MockEncounterWorld::new();
        let mut rng = EncounterRng::new(7);
        drive_to_active(&mut m, &mut world, &mut rng);

        for id in m.tracked_pylons().to_vec().into_iter().take(3) {
            world.destroy_pylon(id);
            m.notify_pylon_destroyed(id);
        }
        assert_eq!(m.pylons_destroyed(), 3);
        slay_wyrm(&mut m, &mut world, &mut rng);
        assert_eq!(m.pylons_destroyed(), 10);

        // ritual restart: the monotone count seeds the next wyrm at zero
        // resistance
        let arena = ArenaLayout::default();
        for pad in arena.ritual_pads() {
            world.spawn_pylon(DimensionId::RIFT, pad);
        }
        for _ in 0..200 {
            m.tick(DT, &mut world, &mut rng);
            if m.phase() == EncounterPhase::Active {
                break;
            }
        }
        assert_eq!(m.phase(), EncounterPhase::Active);
        assert!(m.wyrm().map_or(1.0, Wyrm::resistance).abs() < 1e-6);
    }

    #[test]
    fn test_rewards_split_with_remainder_as_orbs() {
        let mut m = manager();
        let mut world = MockEncounterWorld::new();
        m.participants = (0..7).map(|i| EntityId::from_raw(100 + i)).collect();

        m.distribute_rewards(&mut world);

        // 12000 / 7 = 1714 each, 11998 granted, 2 left as orbs
        assert_eq!(world.grants.len(), 7);
        assert!(world.grants.iter().all(|(_, amount)| *amount == 1714));
        assert_eq!(world.orbs.len(), 1);
        assert_eq!(world.orbs[0].1, 2);
    }

    #[test]
    fn test_rewards_minimum_binds_for_large_groups() {
        let mut m = manager();
        let mut world = MockEncounterWorld::new();
        m.participants = (0..30).map(|i| EntityId::from_raw(100 + i)).collect();

        m.distribute_rewards(&mut world);

        // 12000 / 30 = 400, below the 500 floor; everyone gets the floor
        assert!(world.grants.iter().all(|(_, amount)| *amount == 500));
        assert!(world.orbs.is_empty());
    }

    #[test]
    fn test_rewards_without_participants_become_orbs() {
        let mut m = manager();
        let mut world = MockEncounterWorld::new();

        m.distribute_rewards(&mut world);

        assert!(world.grants.is_empty());
        assert_eq!(world.orbs.len(), 1);
        assert_eq!(world.orbs[0].1, m.config.reward_pool);
    }

    proptest! {
        #[test]
        fn prop_reward_pool_is_never_lost(
            pool in 0u64..100_000,
            players in 0usize..50,
            minimum in 0u64..2_000,
        ) {
            let config = EncounterConfig {
                reward_pool: pool,
                reward_minimum: minimum,
                ..EncounterConfig::default()
            };
            let mut m = EncounterManager::new(
                config,
                WyrmConfig::default(),
                ArenaLayout::default(),
            );
            let mut world = MockEncounterWorld::new();
            m.participants = (0..players)
                .map(|i| EntityId::from_raw(100 + i as u64))
                .collect();

            m.distribute_rewards(&mut world);

            let granted: u64 = world.grants.iter().map(|(_, a)| a).sum();
            let orbs: u64 = world.orbs.iter().map(|(_, a)| a).sum();
            prop_assert!(granted + orbs >= pool);
            let share = if players == 0 { 0 } else { pool / players as u64 };
            if players > 0 && share >= minimum {
                prop_assert_eq!(granted + orbs, pool);
            }
            for (_, amount) in &world.grants {
                prop_assert_eq!(*amount, share.max(minimum));
            }
        }
    }

    #[test]
    fn test_gateway_cap_holds() {
        let mut m = manager();
        let mut world = MockEncounterWorld::new();
        m.gateways_created = m.config.gateway_cap - 1;

        m.enter_reset(&mut world);
        assert_eq!(m.gateways_created(), m.config.gateway_cap);
        assert_eq!(world.count_blocks(BlockKind::GatewayFrame), 2);

        // past the cap: reset still runs, no new gateway
        let mut world = MockEncounterWorld::new();
        m.clock = PhaseClock::new(EncounterPhase::Victory);
        m.enter_reset(&mut world);
        assert_eq!(m.gateways_created(), m.config.gateway_cap);
        assert_eq!(world.count_blocks(BlockKind::GatewayFrame), 0);
    }

    #[test]
    fn test_trophy_only_on_first_completion() {
        let mut m = manager();
        let mut world = MockEncounterWorld::new();
        let trophy = ArenaLayout::default().trophy_block();
        m.first_completion = true;

        m.enter_reset(&mut world);
        assert_eq!(world.block(trophy), BlockKind::Trophy);

        let mut world = MockEncounterWorld::new();
        m.clock = PhaseClock::new(EncounterPhase::Victory);
        m.enter_reset(&mut world);
        assert_eq!(world.block(trophy), BlockKind::Air);
    }

    #[test]
    fn test_exit_gate_rebuild_is_idempotent() {
        let mut m = manager();
        let mut world = MockEncounterWorld::new();

        m.enter_reset(&mut world);
        let center = ArenaLayout::default().center;
        let before = world.block(center);

        m.clock = PhaseClock::new(EncounterPhase::Victory);
        m.enter_reset(&mut world);
        assert_eq!(world.block(center), before);
        assert_eq!(before, BlockKind::AnchorStone);
    }

    #[test]
    fn test_save_restore_resumes_mid_fight() {
        let mut m = manager();
        let mut world = MockEncounterWorld::new();
        let mut rng = EncounterRng::new(12);
        drive_to_active(&mut m, &mut world, &mut rng);

        let id = m.tracked_pylons()[0];
        world.destroy_pylon(id);
        m.notify_pylon_destroyed(id);
        if let Some(wyrm) = m.wyrm_mut() {
            wyrm.apply_damage(20.0, None);
        }
        let data = m.snapshot();

        let mut restored = EncounterManager::restore(
            fast_config(),
            WyrmConfig::default(),
            ArenaLayout::default(),
            &data,
        );
        restored.tick(DT, &mut world, &mut rng);

        assert_eq!(restored.phase(), EncounterPhase::Active);
        assert_eq!(restored.pylons_destroyed(), 1);
        assert_eq!(restored.tracked_pylons().len(), 9);
        let wyrm = restored.wyrm().map(|w| (w.health(), w.resistance()));
        assert!(wyrm.is_some());
        if let Some((health, resistance)) = wyrm {
            assert!(health < WyrmConfig::default().max_health);
            assert!((resistance - 0.45).abs() < 1e-6);
        }
    }

    #[test]
    fn test_corrupt_phase_tag_decodes_to_waiting() {
        assert_eq!(EncounterPhase::from_raw(200), EncounterPhase::Waiting);
        assert_eq!(EncounterPhase::from_raw(4), EncounterPhase::Reset);
    }
}
