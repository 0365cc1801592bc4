//! # Wyrmgate Encounter
//!
//! The rift boss encounter for Project Wyrmgate.
//!
//! This crate provides the full fight, from arena idle to permanent
//! aftermath:
//! - Six-phase wyrm flight agent with pylon-driven damage resistance
//! - Five-phase orchestrator (waiting, preparing, active, victory, reset)
//! - Ward pylons that heal the wyrm until destroyed
//! - Respawn ritual recognition and reward distribution
//! - Arena layout math (spires, pads, gateways, exit gate)
//! - Framed binary persistence for mid-fight restarts
//! - Event bus for observers (HUD, audio, analytics)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod arena;
pub mod config;
pub mod encounter;
pub mod events;
pub mod fsm;
pub mod rng;
pub mod save;
pub mod world;
pub mod wyrm;


/// Prelude for convenient imports
pub mod prelude {
    pub use crate::arena::*;
    pub use crate::config::*;
    pub use crate::encounter::*;
    pub use crate::events::*;
    pub use crate::fsm::*;
    pub use crate::rng::*;
    pub use crate::save::*;
    pub use crate::world::*;
    pub use crate::wyrm::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_encounter_is_idle() {
        let manager = EncounterManager::new(
            EncounterConfig::default(),
            WyrmConfig::default(),
            ArenaLayout::default(),
        );

        assert_eq!(manager.phase(), EncounterPhase::Waiting);
        assert!(manager.wyrm().is_none());
        assert_eq!(manager.pylons_destroyed(), 0);
        assert!(!manager.completed_before());
    }

    #[test]
    fn test_arena_holds_the_configured_pylon_ring() {
        let arena = ArenaLayout::default();
        let config = EncounterConfig::default();

        let spires = arena.spire_positions(config.pylon_count);
        assert_eq!(spires.len(), config.pylon_count as usize);

        let center = arena.center_point();
        for spire in spires {
            let dx = spire.x - center.x;
            let dz = spire.z - center.z;
            assert!((dx * dx + dz * dz).sqrt() <= arena.spire_radius + 0.01);
        }
    }

    #[test]
    fn test_resistance_scale_spans_the_pylon_count() {
        let config = WyrmConfig::default();
        assert!((config.resistance_for(0) - 0.5).abs() < 1e-6);
        assert!(config.resistance_for(10).abs() < 1e-6);
        assert!(config.resistance_for(200).abs() < 1e-6);
    }

    #[test]
    fn test_bus_delivers_published_events() {
        let bus = EventBus::default();
        bus.publish(EncounterEvent::WyrmDied);

        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(matches!(drained[0], EncounterEvent::WyrmDied));
    }
}
