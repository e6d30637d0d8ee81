//! Counters shown in the debug overlay and logged on shutdown.

use bevy_ecs::prelude::Resource;

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimStats {
    /// Vehicles tracked after the last tick.
    pub vehicles: usize,
    /// Traffic lights tracked after the last tick.
    pub traffic_lights: usize,
    /// Lane polylines drawn.
    pub lanes: usize,
    /// Attribute fetches that failed during the last tick.
    pub fetch_failures: usize,
    /// Attribute fetches that failed since startup.
    pub total_fetch_failures: usize,
    /// Reconciliation passes skipped because listing live ids failed.
    pub skipped_passes: usize,
    /// Spawn requests the simulator refused.
    pub spawn_failures: usize,
}
