//! Tuning tables for the wyrm and the encounter lifecycle.
//!
//! Every speed, chance, dwell, radius and cap lives here so designers
//! can retune the fight without touching behavior code. Defaults are
//! the shipped balance.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Behavior tuning for the wyrm agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WyrmConfig {
    /// Maximum (and spawn) health.
    pub max_health: f32,
    /// Damage resistance fraction with no pylons destroyed.
    pub base_resistance: f32,
    /// Resistance lost per destroyed pylon.
    pub resistance_step: f32,
    /// Collision half-extents of the body box.
    pub half_extents: Vec3,
    /// Cruise speed while circling.
    pub flight_speed: f32,
    /// Descent speed during a dive.
    pub dive_speed: f32,
    /// Flight speed while charging a pylon.
    pub charge_speed: f32,
    /// Flight speed while strafing.
    pub strafe_speed: f32,
    /// Flight speed while moving to the perch.
    pub perch_speed: f32,
    /// Fraction of horizontal velocity retained after one second.
    pub horizontal_drag: f32,
    /// Downward pull on vertical velocity while airborne (blocks/s^2).
    pub gravity: f32,
    /// Distance at which a goal point counts as reached.
    pub arrive_radius: f32,
    /// Damage dealt to players touching the body box.
    pub contact_damage: f32,
    /// Seconds between contact damage applications.
    pub contact_cooldown: f32,
    /// Seconds between ranged attacks.
    pub ranged_cooldown: f32,
    /// Range within which the ranged attack can be launched.
    pub ranged_fire_range: f32,
    /// Ticks the advisory firing flag stays set after a launch.
    pub firing_duration_ticks: u64,
    /// Minimum seconds in Circling before transition rolls begin.
    pub circling_min_dwell: f32,
    /// Per-tick perch chance with no pylons destroyed.
    pub perch_chance_base: f32,
    /// Added per-tick perch chance per destroyed pylon.
    pub perch_chance_per_destroyed: f32,
    /// Per-tick charge chance, scaled by destroyed pylons + 1.
    pub charge_chance_base: f32,
    /// Per-tick chance to open an attack run (dive or strafe).
    pub attack_chance: f32,
    /// Height above the target where a dive stoops from.
    pub dive_height: f32,
    /// Blast radius of the dive impact.
    pub dive_blast_radius: f32,
    /// Damage dealt to players caught in the dive impact.
    pub dive_damage: f32,
    /// Seconds before a dive is abandoned.
    pub dive_max_dwell: f32,
    /// Pylon must be within this range for a charge to trigger.
    pub charge_trigger_range: f32,
    /// Seconds spent hovering at the charge point after firing.
    pub charge_linger: f32,
    /// Seconds before a charge is abandoned.
    pub charge_max_dwell: f32,
    /// Ring radius around the target for the strafe point.
    pub strafe_radius: f32,
    /// Seconds before a strafe run is abandoned.
    pub strafe_max_dwell: f32,
    /// Seconds spent on the perch before returning to the air.
    pub perch_dwell: f32,
    /// Constant descent speed while dying.
    pub death_descent_speed: f32,
    /// Seconds the grounded carcass lingers before despawn.
    pub death_settle_time: f32,
    /// Health regained per second near a live pylon.
    pub heal_per_second: f32,
    /// Search radius for the nearest live pylon.
    pub pylon_search_radius: f32,
    /// Number of waypoints in a circling loop.
    pub waypoint_count: usize,
    /// Ring radius of the circling loop.
    pub circling_radius: f32,
    /// Height of the circling loop above the arena floor.
    pub circling_height: f32,
    /// Random vertical jitter applied to each waypoint.
    pub waypoint_jitter: f32,
}

impl Default for WyrmConfig {
    fn default() -> Self {
        Self {
            max_health: 200.0,
            base_resistance: 0.5,
            resistance_step: 0.05,
            half_extents: Vec3::new(3.0, 1.5, 3.0),
            flight_speed: 8.0,
            dive_speed: 18.0,
            charge_speed: 14.0,
            strafe_speed: 10.0,
            perch_speed: 12.0,
            horizontal_drag: 0.4,
            gravity: 6.0,
            arrive_radius: 2.0,
            contact_damage: 10.0,
            contact_cooldown: 2.0,
            ranged_cooldown: 5.0,
            ranged_fire_range: 24.0,
            firing_duration_ticks: 10,
            circling_min_dwell: 6.0,
            perch_chance_base: 0.002,
            perch_chance_per_destroyed: 0.001,
            charge_chance_base: 0.003,
            attack_chance: 0.01,
            dive_height: 12.0,
            dive_blast_radius: 4.0,
            dive_damage: 15.0,
            dive_max_dwell: 8.0,
            charge_trigger_range: 40.0,
            charge_linger: 1.5,
            charge_max_dwell: 10.0,
            strafe_radius: 20.0,
            strafe_max_dwell: 12.0,
            perch_dwell: 8.0,
            death_descent_speed: 3.0,
            death_settle_time: 4.0,
            heal_per_second: 2.0,
            pylon_search_radius: 48.0,
            waypoint_count: 8,
            circling_radius: 24.0,
            circling_height: 20.0,
            waypoint_jitter: 4.0,
        }
    }
}

impl WyrmConfig {
    /// Damage resistance with `destroyed` pylons down, clamped at zero.
    #[must_use]
    pub fn resistance_for(&self, destroyed: u32) -> f32 {
        (self.base_resistance - self.resistance_step * destroyed as f32).max(0.0)
    }
}

/// Lifecycle tuning for the encounter orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterConfig {
    /// Pylons spawned at the start of each encounter.
    pub pylon_count: u32,
    /// Seconds spent in Preparing before the wyrm spawns.
    pub preparing_dwell: f32,
    /// Seconds spent in Victory before permanent mutations run.
    pub victory_dwell: f32,
    /// Seconds between ritual completion and encounter start.
    pub respawn_countdown: f32,
    /// A pylon within this range of a pad occupies it.
    pub ritual_pad_radius: f32,
    /// Victory reward pool in points.
    pub reward_pool: u64,
    /// Minimum per-participant reward in points.
    pub reward_minimum: u64,
    /// Lifetime cap on carved gateways.
    pub gateway_cap: u32,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            pylon_count: 10,
            preparing_dwell: 20.0,
            victory_dwell: 10.0,
            respawn_countdown: 5.0,
            ritual_pad_radius: 1.5,
            reward_pool: 12_000,
            reward_minimum: 500,
            gateway_cap: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resistance_scale() {
        let config = WyrmConfig::default();
        assert!((config.resistance_for(0) - 0.5).abs() < 1e-6);
        assert!((config.resistance_for(3) - 0.35).abs() < 1e-6);
        assert!((config.resistance_for(10)).abs() < 1e-6);
        // Past the roster size the clamp holds
        assert!((config.resistance_for(25)).abs() < 1e-6);
    }

    #[test]
    fn test_default_balance_sanity() {
        let wyrm = WyrmConfig::default();
        assert!(wyrm.dive_speed > wyrm.flight_speed);
        assert!(wyrm.base_resistance <= 1.0);
        assert!(wyrm.horizontal_drag > 0.0 && wyrm.horizontal_drag < 1.0);
        // a pull stronger than the slowest flight speed would fight the
        // steering visibly between corrections
        assert!(wyrm.gravity > 0.0 && wyrm.gravity < wyrm.flight_speed);

        let enc = EncounterConfig::default();
        assert_eq!(enc.pylon_count, 10);
        assert!(enc.reward_minimum * u64::from(enc.pylon_count) < enc.reward_pool);
    }
}
