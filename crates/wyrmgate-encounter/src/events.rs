//! Event bus for encounter notifications.
//!
//! Downstream systems (HUD boss bars, achievements, network relays)
//! observe the fight through these events rather than by polling the
//! state machines.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use wyrmgate_common::EntityId;

use crate::encounter::EncounterPhase;
use crate::wyrm::WyrmPhase;

/// Event types published over the encounter bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EncounterEvent {
    /// The wyrm moved to a new behavior phase
    WyrmPhaseChanged {
        /// Phase it left
        from: WyrmPhase,
        /// Phase it entered
        to: WyrmPhase,
    },
    /// The encounter lifecycle moved to a new phase
    EncounterPhaseChanged {
        /// Phase it left
        from: EncounterPhase,
        /// Phase it entered
        to: EncounterPhase,
    },
    /// The wyrm took damage
    WyrmDamaged {
        /// Health remaining after the hit
        remaining_health: f32,
        /// Damage applied after resistance
        applied: f32,
        /// Attacking entity, if attributable
        source: Option<EntityId>,
    },
    /// The wyrm finished its death sequence
    WyrmDied,
    /// The wyrm launched a ranged attack
    RangedAttackFired {
        /// Launch position (x, y, z)
        origin: [f32; 3],
        /// Aim position (x, y, z)
        target: [f32; 3],
    },
    /// A ward pylon was destroyed
    PylonDestroyed {
        /// The destroyed pylon
        pylon: EntityId,
        /// Total pylons destroyed so far
        destroyed_count: u32,
    },
    /// Victory rewards were handed out
    RewardsDistributed {
        /// Number of players who received a share
        participants: u32,
        /// Points granted directly
        granted: u64,
        /// Points placed as collectible orbs
        placed_as_orbs: u64,
    },
}

/// Event bus for broadcasting encounter events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<EncounterEvent>,
    /// Receiver for collecting events
    receiver: Receiver<EncounterEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: EncounterEvent) {
        // Non-blocking send - if full, event is dropped
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<EncounterEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<EncounterEvent> {
        self.sender.clone()
    }
}

/// Typed event handler trait.
pub trait EventHandler: Send + Sync {
    /// Handles an event.
    fn handle(&self, event: &EncounterEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        bus.publish(EncounterEvent::WyrmDied);
        bus.publish(EncounterEvent::PylonDestroyed {
            pylon: EntityId::from_raw(5),
            destroyed_count: 1,
        });

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], EncounterEvent::WyrmDied));
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops_instead_of_blocking() {
        let bus = EventBus::new(1);
        bus.publish(EncounterEvent::WyrmDied);
        bus.publish(EncounterEvent::WyrmDied);
        assert_eq!(bus.pending_count(), 1);
    }

    #[test]
    fn test_detached_sender_feeds_bus() {
        let bus = EventBus::new(4);
        let sender = bus.sender();
        let _ = sender.try_send(EncounterEvent::WyrmDamaged {
            remaining_health: 150.0,
            applied: 5.0,
            source: None,
        });
        assert_eq!(bus.drain().len(), 1);
    }
}
