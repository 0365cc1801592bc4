//! The wyrm: autonomous boss agent of the rift encounter.
//!
//! The wyrm runs a six-phase behavior machine:
//! - `Circling`: follows a waypoint loop above the arena, rolling for
//!   its next move
//! - `Diving`: stoops onto the current target and detonates on impact
//! - `Charging`: rushes a ward pylon and fires on it
//! - `Strafing`: flies an offset run past the target, firing bolts
//! - `Perching`: lands on the exit gate and snipes from the roost
//! - `Dying`: terminal descent, carcass settle, death announcement
//!
//! One tick advances the clock, resolves the target by ID, runs the
//! phase handler, integrates motion, tends pylon healing and applies
//! contact damage. At most one handler transition happens per tick; a
//! lethal hit forces `Dying` immediately and nothing leaves it.

use crossbeam_channel::Sender;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use tracing::debug;

use wyrmgate_common::EntityId;

use crate::arena::ArenaLayout;
use crate::config::WyrmConfig;
use crate::events::EncounterEvent;
use crate::fsm::PhaseClock;
use crate::rng::EncounterRng;
use crate::save::WyrmSaveData;
use crate::world::{Aabb, EncounterWorld, PlayerState, PylonState, WorldEffect};

/// Behavior phases of the wyrm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WyrmPhase {
    /// Flying the waypoint loop, deciding what to do next.
    Circling,
    /// Stooping onto the current target.
    Diving,
    /// Rushing a ward pylon to fire on it.
    Charging,
    /// Offset attack run past the target.
    Strafing,
    /// Roosting on the exit gate.
    Perching,
    /// Terminal death sequence.
    Dying,
}

impl WyrmPhase {
    /// Get the display name for this phase.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Circling => "Circling",
            Self::Diving => "Diving",
            Self::Charging => "Charging",
            Self::Strafing => "Strafing",
            Self::Perching => "Perching",
            Self::Dying => "Dying",
        }
    }

    /// Whether this phase can never be left.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Dying)
    }

    /// Stable tag for persistence.
    #[must_use]
    pub const fn as_raw(self) -> u8 {
        match self {
            Self::Circling => 0,
            Self::Diving => 1,
            Self::Charging => 2,
            Self::Strafing => 3,
            Self::Perching => 4,
            Self::Dying => 5,
        }
    }

    /// Decodes a persisted tag. Unknown tags fall back to `Circling`.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Circling,
            1 => Self::Diving,
            2 => Self::Charging,
            3 => Self::Strafing,
            4 => Self::Perching,
            5 => Self::Dying,
            _ => Self::Circling,
        }
    }
}

/// Notifications the wyrm queues for its owner.
///
/// The orchestrator drains these once per tick; they are the only way
/// state changes leave the agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WyrmNotification {
    /// The wyrm entered a new phase.
    PhaseChanged {
        /// Phase it left
        from: WyrmPhase,
        /// Phase it entered
        to: WyrmPhase,
    },
    /// The wyrm survived a hit.
    Damaged {
        /// Health remaining after the hit
        remaining_health: f32,
        /// Damage applied after resistance
        applied: f32,
        /// Attacking entity, if attributable
        source: Option<EntityId>,
    },
    /// The death sequence finished; the carcass can be removed.
    Died,
}

/// Advisory "mouth is firing" flag with tick-counted expiry.
///
/// Each arm bumps the generation; a clear with a stale generation is a
/// no-op, so a late clear from a previous attack can never cancel the
/// current one. Damage never consults this flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FiringFlag {
    generation: u64,
    expires_at_tick: Option<u64>,
}

impl FiringFlag {
    /// Creates an unarmed flag.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            generation: 0,
            expires_at_tick: None,
        }
    }

    /// Arms the flag until `now + duration`, returning the new generation.
    pub fn arm(&mut self, now: u64, duration: u64) -> u64 {
        self.generation += 1;
        self.expires_at_tick = Some(now + duration);
        self.generation
    }

    /// Clears the flag if `generation` is still current.
    pub fn clear(&mut self, generation: u64) {
        if generation == self.generation {
            self.expires_at_tick = None;
        }
    }

    /// Expires the flag once its tick passes.
    pub fn expire(&mut self, now: u64) {
        if let Some(at) = self.expires_at_tick {
            if now >= at {
                self.expires_at_tick = None;
            }
        }
    }

    /// Whether the flag is currently set.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.expires_at_tick.is_some()
    }

    /// The current generation token.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// The boss agent.
#[derive(Debug)]
pub struct Wyrm {
    entity: EntityId,
    config: WyrmConfig,
    arena: ArenaLayout,
    clock: PhaseClock<WyrmPhase>,
    position: Vec3,
    velocity: Vec3,
    yaw: f32,
    pitch: f32,
    health: f32,
    invulnerable: bool,
    pylons_destroyed: u32,
    target: Option<EntityId>,
    aggroed: bool,
    nearest_pylon: Option<EntityId>,
    path_points: Vec<Vec3>,
    path_index: usize,
    contact_cooldown: f32,
    ranged_cooldown: f32,
    firing: FiringFlag,
    tick_count: u64,
    bus: Option<Sender<EncounterEvent>>,
    // per-phase scratch, cleared on every transition
    charge_point: Option<Vec3>,
    charge_fired_at: Option<f32>,
    strafe_point: Option<Vec3>,
    dive_descending: bool,
    death_grounded_at: Option<f32>,
    death_announced: bool,
    pending: Vec<WyrmNotification>,
}

impl Wyrm {
    /// Creates a wyrm at full health in the circling phase.
    ///
    /// `pylons_destroyed` seeds the damage resistance; the orchestrator
    /// carries the count across encounters.
    #[must_use]
    pub fn new(
        entity: EntityId,
        config: WyrmConfig,
        arena: ArenaLayout,
        pylons_destroyed: u32,
        spawn: Vec3,
    ) -> Self {
        let health = config.max_health;
        Self {
            entity,
            config,
            arena,
            clock: PhaseClock::new(WyrmPhase::Circling),
            position: spawn,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            health,
            invulnerable: false,
            pylons_destroyed,
            target: None,
            aggroed: false,
            nearest_pylon: None,
            path_points: Vec::new(),
            path_index: 0,
            contact_cooldown: 0.0,
            ranged_cooldown: 0.0,
            firing: FiringFlag::new(),
            tick_count: 0,
            bus: None,
            charge_point: None,
            charge_fired_at: None,
            strafe_point: None,
            dive_descending: false,
            death_grounded_at: None,
            death_announced: false,
            pending: Vec::new(),
        }
    }

    /// Restores a wyrm from a persisted record.
    ///
    /// A record with no health left resumes directly in the death
    /// sequence regardless of its stored phase tag.
    #[must_use]
    pub fn restore(
        entity: EntityId,
        config: WyrmConfig,
        arena: ArenaLayout,
        data: &WyrmSaveData,
    ) -> Self {
        let mut phase = WyrmPhase::from_raw(data.phase);
        let health = data.health.clamp(0.0, config.max_health);
        if health <= 0.0 {
            phase = WyrmPhase::Dying;
        }
        let mut wyrm = Self::new(entity, config, arena, data.pylons_destroyed, Vec3::ZERO);
        wyrm.clock = PhaseClock::restore(phase, data.phase_elapsed);
        wyrm.position = Vec3::from_array(data.position);
        wyrm.velocity = Vec3::from_array(data.velocity);
        wyrm.yaw = data.yaw;
        wyrm.pitch = data.pitch;
        wyrm.health = health;
        wyrm.tick_count = data.tick_count;
        if phase.is_terminal() {
            wyrm.invulnerable = true;
            wyrm.velocity = Vec3::new(0.0, -wyrm.config.death_descent_speed, 0.0);
        }
        wyrm
    }

    /// Captures the persistable state of the wyrm.
    #[must_use]
    pub fn snapshot(&self) -> WyrmSaveData {
        WyrmSaveData {
            phase: self.clock.phase().as_raw(),
            phase_elapsed: self.clock.elapsed(),
            position: self.position.to_array(),
            velocity: self.velocity.to_array(),
            yaw: self.yaw,
            pitch: self.pitch,
            health: self.health,
            pylons_destroyed: self.pylons_destroyed,
            tick_count: self.tick_count,
        }
    }

    /// Attaches a bus sender for observational events.
    pub fn set_event_sender(&mut self, sender: Sender<EncounterEvent>) {
        self.bus = Some(sender);
    }

    // === Accessors ===

    /// The wyrm's world entity ID.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Current behavior phase.
    #[must_use]
    pub const fn phase(&self) -> WyrmPhase {
        self.clock.phase()
    }

    /// Seconds spent in the current phase.
    #[must_use]
    pub const fn phase_elapsed(&self) -> f32 {
        self.clock.elapsed()
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Current world-space position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Current velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Current damage resistance, derived from destroyed pylons.
    #[must_use]
    pub fn resistance(&self) -> f32 {
        self.config.resistance_for(self.pylons_destroyed)
    }

    /// Destroyed-pylon count the resistance is derived from.
    #[must_use]
    pub const fn pylons_destroyed(&self) -> u32 {
        self.pylons_destroyed
    }

    /// Current target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Whether the wyrm has locked onto a player since spawning.
    #[must_use]
    pub const fn aggroed(&self) -> bool {
        self.aggroed
    }

    /// Nearest live pylon found this tick, if any.
    #[must_use]
    pub const fn nearest_pylon(&self) -> Option<EntityId> {
        self.nearest_pylon
    }

    /// Whether the advisory firing flag is set.
    #[must_use]
    pub const fn is_firing(&self) -> bool {
        self.firing.is_set()
    }

    /// Generation token of the firing flag.
    #[must_use]
    pub const fn firing_generation(&self) -> u64 {
        self.firing.generation()
    }

    /// Waypoints left in the current circling loop.
    #[must_use]
    pub fn path_remaining(&self) -> usize {
        self.path_points.len().saturating_sub(self.path_index)
    }

    /// Body box at the current position.
    #[must_use]
    pub fn body_box(&self) -> Aabb {
        Aabb::from_center(self.position, self.config.half_extents)
    }

    // === Owner interface ===

    /// Updates the destroyed-pylon count (owner is the single writer).
    pub fn set_pylons_destroyed(&mut self, count: u32) {
        self.pylons_destroyed = count;
    }

    /// Takes all queued notifications.
    pub fn drain_notifications(&mut self) -> Vec<WyrmNotification> {
        std::mem::take(&mut self.pending)
    }

    /// Clears the firing flag if `generation` is still current.
    ///
    /// Stale generations are ignored, so a clear scheduled for an old
    /// attack cannot cancel a newer one.
    pub fn clear_firing(&mut self, generation: u64) {
        self.firing.clear(generation);
    }

    /// Applies incoming damage through the resistance.
    ///
    /// A lethal hit forces the death sequence in the same call,
    /// overriding whatever the current phase was about to do.
    pub fn apply_damage(&mut self, amount: f32, source: Option<EntityId>) {
        if self.invulnerable || self.health <= 0.0 {
            return;
        }
        let applied = amount * (1.0 - self.resistance());
        self.health -= applied;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.transition_to(WyrmPhase::Dying);
        } else {
            self.pending.push(WyrmNotification::Damaged {
                remaining_health: self.health,
                applied,
                source,
            });
        }
    }

    // === Tick pipeline ===

    /// Advances the wyrm by one tick.
    pub fn tick<W: EncounterWorld>(&mut self, dt: f32, world: &mut W, rng: &mut EncounterRng) {
        self.tick_count += 1;
        self.clock.advance(dt);
        self.contact_cooldown = (self.contact_cooldown - dt).max(0.0);
        self.ranged_cooldown = (self.ranged_cooldown - dt).max(0.0);
        self.firing.expire(self.tick_count);

        let players = world.players_in(self.arena.dimension);
        let pylons = world.pylons_in(self.arena.dimension);
        self.resolve_target(&players);

        match self.clock.phase() {
            WyrmPhase::Circling => self.tick_circling(&players, &pylons, rng),
            WyrmPhase::Diving => self.tick_diving(&players, world),
            WyrmPhase::Charging => self.tick_charging(world),
            WyrmPhase::Strafing => self.tick_strafing(&players, world),
            WyrmPhase::Perching => self.tick_perching(&players, world),
            WyrmPhase::Dying => self.tick_dying(),
        }

        self.integrate(dt);
        self.tend_pylons(dt, &pylons, world);
        self.contact_sweep(&players, world);
        world.set_entity_transform(self.entity, self.position, self.yaw, self.pitch);
    }

    /// Picks the nearest player as target, keeping the old ID when the
    /// dimension is empty. A switch never resets the phase clock.
    fn resolve_target(&mut self, players: &[PlayerState]) {
        let nearest = players.iter().min_by(|a, b| {
            let da = a.position.distance_squared(self.position);
            let db = b.position.distance_squared(self.position);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        if let Some(player) = nearest {
            if self.target != Some(player.id) {
                debug!("wyrm target switched to {:?}", player.id);
                self.target = Some(player.id);
                // acquiring a target marks the wyrm aggroed; the phase
                // clock is untouched
                self.aggroed = true;
            }
        }
    }

    fn tick_circling(
        &mut self,
        players: &[PlayerState],
        pylons: &[PylonState],
        rng: &mut EncounterRng,
    ) {
        if self.path_points.is_empty() {
            self.generate_path(rng);
        }
        if let Some(goal) = self.path_points.get(self.path_index).copied() {
            if self.position.distance(goal) < self.config.arrive_radius {
                self.path_index += 1;
                if self.path_index >= self.path_points.len() {
                    // loop exhausted, rebuild next tick
                    self.path_points.clear();
                    self.path_index = 0;
                }
            } else {
                self.steer_toward(goal, self.config.flight_speed);
            }
        }

        if self.clock.elapsed() < self.config.circling_min_dwell {
            return;
        }

        // Decision rolls, fixed order, first success wins.
        let destroyed = self.pylons_destroyed as f32;
        let perch_chance = self.config.perch_chance_base
            + self.config.perch_chance_per_destroyed * destroyed;
        if rng.chance(perch_chance) {
            self.transition_to(WyrmPhase::Perching);
            return;
        }

        if let Some(pylon_point) = self.charge_candidate(pylons) {
            if rng.chance(self.config.charge_chance_base * (destroyed + 1.0)) {
                self.begin_charge(pylon_point);
                return;
            }
        }

        let target_point = self.target_position(players);
        if let Some(point) = target_point {
            if rng.chance(self.config.attack_chance) {
                if rng.chance(0.5) {
                    self.transition_to(WyrmPhase::Diving);
                } else {
                    self.begin_strafe(point, rng);
                }
            }
        }
    }

    fn tick_diving<W: EncounterWorld>(&mut self, players: &[PlayerState], world: &mut W) {
        let Some(target_point) = self.target_position(players) else {
            self.transition_to(WyrmPhase::Circling);
            return;
        };

        if !self.dive_descending {
            let stoop = Vec3::new(
                target_point.x,
                target_point.y + self.config.dive_height,
                target_point.z,
            );
            if self.position.distance(stoop) < self.config.arrive_radius {
                self.dive_descending = true;
            } else {
                self.steer_toward(stoop, self.config.flight_speed);
            }
        }

        if self.dive_descending {
            self.steer_toward(target_point, self.config.dive_speed);
            let reached = self.position.distance(target_point) < self.config.arrive_radius;
            let grounded = self.position.y <= self.arena.ground_level() + 0.5;
            if reached || grounded {
                self.dive_impact(players, world);
                self.transition_to(WyrmPhase::Circling);
                return;
            }
        }

        if self.clock.elapsed() > self.config.dive_max_dwell {
            self.transition_to(WyrmPhase::Circling);
        }
    }

    fn dive_impact<W: EncounterWorld>(&mut self, players: &[PlayerState], world: &mut W) {
        world.emit(WorldEffect::ImpactBurst {
            center: self.position,
            radius: self.config.dive_blast_radius,
        });
        for player in players {
            if player.position.distance(self.position) <= self.config.dive_blast_radius {
                world.emit(WorldEffect::ContactAttack {
                    target: player.id,
                    damage: self.config.dive_damage,
                });
            }
        }
    }

    fn tick_charging<W: EncounterWorld>(&mut self, world: &mut W) {
        let Some(point) = self.charge_point else {
            self.transition_to(WyrmPhase::Circling);
            return;
        };

        if let Some(fired_at) = self.charge_fired_at {
            // hold near the pylon until the linger runs out
            self.steer_toward(point, self.config.charge_speed * 0.25);
            if self.clock.elapsed() - fired_at > self.config.charge_linger {
                self.transition_to(WyrmPhase::Circling);
                return;
            }
        } else if self.position.distance(point) <= self.config.ranged_fire_range {
            if self.ranged_cooldown <= 0.0 {
                self.fire_ranged(point, world);
                self.charge_fired_at = Some(self.clock.elapsed());
            }
            self.steer_toward(point, self.config.charge_speed * 0.5);
        } else {
            self.steer_toward(point, self.config.charge_speed);
        }

        if self.clock.elapsed() > self.config.charge_max_dwell {
            self.transition_to(WyrmPhase::Circling);
        }
    }

    fn tick_strafing<W: EncounterWorld>(&mut self, players: &[PlayerState], world: &mut W) {
        let Some(point) = self.strafe_point else {
            self.transition_to(WyrmPhase::Circling);
            return;
        };

        if self.ranged_cooldown <= 0.0 {
            if let Some(target_point) = self.target_position(players) {
                self.fire_ranged(target_point, world);
            }
        }

        if self.position.distance(point) < self.config.arrive_radius
            || self.clock.elapsed() > self.config.strafe_max_dwell
        {
            self.transition_to(WyrmPhase::Circling);
            return;
        }
        self.steer_toward(point, self.config.strafe_speed);
    }

    fn tick_perching<W: EncounterWorld>(&mut self, players: &[PlayerState], world: &mut W) {
        let perch = self.arena.perch_point();
        if self.position.distance(perch) > self.config.arrive_radius {
            self.steer_toward(perch, self.config.perch_speed);
            return;
        }

        // roosted: hold still and snipe
        self.velocity = Vec3::ZERO;
        if self.ranged_cooldown <= 0.0 {
            if let Some(target_point) = self.target_position(players) {
                self.fire_ranged(target_point, world);
            }
        }
        if self.clock.elapsed() > self.config.perch_dwell {
            self.transition_to(WyrmPhase::Circling);
        }
    }

    fn tick_dying(&mut self) {
        if self.position.y <= self.arena.ground_level() + 0.1 {
            self.velocity = Vec3::ZERO;
            let grounded_at = *self.death_grounded_at.get_or_insert(self.clock.elapsed());
            let settled = self.clock.elapsed() - grounded_at >= self.config.death_settle_time;
            if settled && !self.death_announced {
                self.death_announced = true;
                self.pending.push(WyrmNotification::Died);
            }
        } else {
            self.velocity = Vec3::new(0.0, -self.config.death_descent_speed, 0.0);
        }
    }

    // === Movement and combat helpers ===

    /// Sets velocity toward a goal. A degenerate direction means no
    /// movement this tick.
    fn steer_toward(&mut self, goal: Vec3, speed: f32) {
        let delta = goal - self.position;
        let len = delta.length();
        if len < 0.001 {
            return;
        }
        self.velocity = delta / len * speed;
    }

    fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;

        let keep = self.config.horizontal_drag.powf(dt);
        self.velocity.x *= keep;
        self.velocity.z *= keep;

        // the death descent holds a fixed speed, unaccelerated
        if !self.clock.phase().is_terminal() {
            self.velocity.y -= self.config.gravity * dt;
        }

        let floor = self.arena.ground_level();
        if self.position.y < floor {
            self.position.y = floor;
            if self.velocity.y < 0.0 {
                self.velocity.y = 0.0;
            }
        }

        let horizontal = (self.velocity.x * self.velocity.x
            + self.velocity.z * self.velocity.z)
            .sqrt();
        if horizontal > 0.001 {
            self.yaw = self.velocity.x.atan2(self.velocity.z);
        }
        if self.velocity.length() > 0.001 {
            self.pitch = self.velocity.y.atan2(horizontal);
        }
    }

    /// Nearest pylon within search range heals the wyrm.
    fn tend_pylons<W: EncounterWorld>(&mut self, dt: f32, pylons: &[PylonState], world: &mut W) {
        self.nearest_pylon = None;
        if self.clock.phase().is_terminal() {
            return;
        }

        let mut best: Option<(EntityId, f32)> = None;
        for pylon in pylons {
            let distance = pylon.position.distance(self.position);
            if distance <= self.config.pylon_search_radius
                && best.map_or(true, |(_, d)| distance < d)
            {
                best = Some((pylon.id, distance));
            }
        }

        if let Some((id, _)) = best {
            self.nearest_pylon = Some(id);
            if self.health < self.config.max_health {
                self.health =
                    (self.health + self.config.heal_per_second * dt).min(self.config.max_health);
                world.emit(WorldEffect::HealBeam {
                    pylon: id,
                    to: self.position,
                });
            }
        }
    }

    /// Players overlapping the body box take contact damage, all at
    /// once, gated by one shared cooldown.
    fn contact_sweep<W: EncounterWorld>(&mut self, players: &[PlayerState], world: &mut W) {
        if self.clock.phase().is_terminal() || self.contact_cooldown > 0.0 {
            return;
        }
        let body = self.body_box().expanded(0.5);
        let mut struck = false;
        for player in players {
            if body.contains(player.position) {
                world.emit(WorldEffect::ContactAttack {
                    target: player.id,
                    damage: self.config.contact_damage,
                });
                struck = true;
            }
        }
        if struck {
            self.contact_cooldown = self.config.contact_cooldown;
        }
    }

    fn fire_ranged<W: EncounterWorld>(&mut self, aim: Vec3, world: &mut W) {
        self.ranged_cooldown = self.config.ranged_cooldown;
        world.emit(WorldEffect::RangedBolt {
            origin: self.position,
            target: aim,
        });
        self.firing
            .arm(self.tick_count, self.config.firing_duration_ticks);
        if let Some(bus) = &self.bus {
            let _ = bus.try_send(EncounterEvent::RangedAttackFired {
                origin: self.position.to_array(),
                target: aim.to_array(),
            });
        }
    }

    fn target_position(&self, players: &[PlayerState]) -> Option<Vec3> {
        let id = self.target?;
        players.iter().find(|p| p.id == id).map(|p| p.position)
    }

    fn charge_candidate(&self, pylons: &[PylonState]) -> Option<Vec3> {
        pylons
            .iter()
            .map(|p| (p.position, p.position.distance(self.position)))
            .filter(|(_, d)| *d <= self.config.charge_trigger_range)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(pos, _)| pos)
    }

    // === Transitions ===

    /// Switches phase, clearing per-phase scratch. Refuses self-edges
    /// and never leaves `Dying`. Returns whether the switch happened.
    fn transition_to(&mut self, next: WyrmPhase) -> bool {
        let current = self.clock.phase();
        if current.is_terminal() || current == next {
            return false;
        }
        let (from, to) = self.clock.set(next);
        self.clear_phase_scratch();
        if to.is_terminal() {
            self.invulnerable = true;
            self.velocity = Vec3::new(0.0, -self.config.death_descent_speed, 0.0);
        }
        debug!(
            "wyrm phase {} -> {}",
            from.display_name(),
            to.display_name()
        );
        self.pending.push(WyrmNotification::PhaseChanged { from, to });
        true
    }

    fn begin_charge(&mut self, point: Vec3) {
        if self.transition_to(WyrmPhase::Charging) {
            self.charge_point = Some(point);
        }
    }

    fn begin_strafe(&mut self, target_point: Vec3, rng: &mut EncounterRng) {
        if self.transition_to(WyrmPhase::Strafing) {
            let angle = rng.next_range(0.0, TAU);
            self.strafe_point = Some(Vec3::new(
                target_point.x + angle.cos() * self.config.strafe_radius,
                self.position.y,
                target_point.z + angle.sin() * self.config.strafe_radius,
            ));
        }
    }

    fn clear_phase_scratch(&mut self) {
        self.path_points.clear();
        self.path_index = 0;
        self.charge_point = None;
        self.charge_fired_at = None;
        self.strafe_point = None;
        self.dive_descending = false;
        self.death_grounded_at = None;
        self.death_announced = false;
    }

    fn generate_path(&mut self, rng: &mut EncounterRng) {
        let center = self.arena.center_point();
        let altitude = self.arena.ground_level() + self.config.circling_height;
        let count = self.config.waypoint_count.max(3);
        let start = rng.next_range(0.0, TAU);
        self.path_points = (0..count)
            .map(|i| {
                let angle = start + TAU * i as f32 / count as f32;
                let jitter =
                    rng.next_range(-self.config.waypoint_jitter, self.config.waypoint_jitter);
                Vec3::new(
                    center.x + angle.cos() * self.config.circling_radius,
                    altitude + jitter,
                    center.z + angle.sin() * self.config.circling_radius,
                )
            })
            .collect();
        self.path_index = 0;
    }
}
