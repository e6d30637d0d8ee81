//! Debug toggle resource.
//!
//! The mere presence of this resource indicates that the debug overlay
//! (frame rate, simulation step, tracked entity counts) should be drawn.
//! Remove it to disable debug behavior.

use bevy_ecs::prelude::Resource;

/// Marker resource: when present, the renderer draws the debug overlay.
#[derive(Resource, Debug, Clone, Copy)]
pub struct DebugMode {}
