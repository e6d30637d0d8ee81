//! Simulation clock update.
//!
//! Advances the shared [`SimClock`](crate::resources::simclock::SimClock)
//! resource once per executed tick. Paused ticks do not call it.
use bevy_ecs::prelude::*;

use crate::resources::simclock::SimClock;

/// Record one executed step of `dt` simulated seconds.
pub fn advance_sim_clock(world: &mut World, dt: f64) {
    let mut clock = world.resource_mut::<SimClock>();
    clock.steps += 1;
    clock.elapsed += dt;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_accumulates_steps() {
        let mut world = World::new();
        world.insert_resource(SimClock::default());
        for _ in 0..4 {
            advance_sim_clock(&mut world, 0.5);
        }
        let clock = world.resource::<SimClock>();
        assert_eq!(clock.steps, 4);
        assert!((clock.elapsed - 2.0).abs() < 1e-9);
    }
}
