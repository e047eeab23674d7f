use bevy_ecs::resource::Resource;
use serde::{Deserialize, Serialize};

/// Simulation clock resource.
///
/// `time` only ever moves forward, advanced by the facade before each tick
/// so every system in that tick observes the post-advance time. Systems
/// read the elapsed simulated span from [`TickDelta`], not from the clock.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    /// Monotonic simulated time.
    pub time: f64,
    /// Multiplier applied to real deltas fed into `update_simulation`.
    pub acceleration: f64,
    /// Number of system passes run so far.
    pub tick_count: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            time: 0.0,
            acceleration: 1.0,
            tick_count: 0,
        }
    }

    /// Advance by an already-scaled simulated delta.
    pub fn advance(&mut self, delta: f64) {
        self.time += delta;
        self.tick_count += 1;
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

/// The simulated delta of the tick currently running. Written by the
/// facade just before `SimTick`, read by the lifecycle and reproduction
/// systems.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct TickDelta(pub f64);
