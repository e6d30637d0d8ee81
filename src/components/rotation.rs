use bevy_ecs::prelude::Component;

/// Heading reported by the simulator, in degrees clockwise from north.
#[derive(Component, Clone, Debug, Copy, Default, PartialEq)]
pub struct Rotation {
    pub degrees: f64,
}
