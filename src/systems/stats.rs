//! Refresh [`SimStats`] after every tick.
use bevy_ecs::prelude::*;

use crate::reconcile::ReconcileReport;
use crate::resources::simstats::SimStats;

/// Store tracked counts and fold the pass reports into the failure counters.
///
/// A `None` report means that kind's pass was skipped this tick.
pub fn update_sim_stats(
    world: &mut World,
    vehicles: usize,
    traffic_lights: usize,
    passes: &[Option<&ReconcileReport>],
) {
    let mut stats = world.resource_mut::<SimStats>();
    stats.vehicles = vehicles;
    stats.traffic_lights = traffic_lights;
    stats.fetch_failures = passes
        .iter()
        .flatten()
        .map(|report| report.failures.len())
        .sum();
    stats.total_fetch_failures += stats.fetch_failures;
    stats.skipped_passes += passes.iter().filter(|p| p.is_none()).count();
}
