//! Canvas size resource.
//!
//! Stores the canvas dimensions in pixels the world bounds were fitted to.
//! It is written once at startup; resizing the window does not refit the
//! network.

use bevy_ecs::prelude::Resource;

/// Canvas size in pixels.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    /// Width in pixels.
    pub w: f64,
    /// Height in pixels.
    pub h: f64,
}
