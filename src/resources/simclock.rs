use bevy_ecs::prelude::Resource;

/// Simulated time as seen by the viewer.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Default)]
pub struct SimClock {
    /// Executed ticks.
    pub steps: u64,
    /// Simulated seconds since startup.
    pub elapsed: f64,
}
