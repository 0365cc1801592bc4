//! Phase clock shared by the wyrm and encounter state machines.
//!
//! Both machines follow the same discipline: the clock advances every
//! tick, at most one transition happens per tick, and elapsed time
//! resets only when the phase actually changes.

use serde::{Deserialize, Serialize};

/// Tracks the current phase of a state machine and how long it has held.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PhaseClock<P> {
    phase: P,
    elapsed: f32,
}

impl<P: Copy + PartialEq> PhaseClock<P> {
    /// Creates a clock starting in the given phase.
    #[must_use]
    pub const fn new(phase: P) -> Self {
        Self {
            phase,
            elapsed: 0.0,
        }
    }

    /// Restores a clock mid-phase (for deserialization).
    #[must_use]
    pub const fn restore(phase: P, elapsed: f32) -> Self {
        Self { phase, elapsed }
    }

    /// The current phase.
    #[must_use]
    pub const fn phase(&self) -> P {
        self.phase
    }

    /// Seconds spent in the current phase.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Advances the in-phase timer. Never changes the phase.
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    /// Switches to `next`, resetting the timer.
    ///
    /// Returns the `(old, new)` pair so the caller can emit a single
    /// phase-changed notification. Setting the current phase again still
    /// resets the timer; callers guard against that where it matters.
    pub fn set(&mut self, next: P) -> (P, P) {
        let old = self.phase;
        self.phase = next;
        self.elapsed = 0.0;
        (old, next)
    }
}
