//! Z-index component for render ordering.
//!
//! Lanes are drawn first, traffic lights on top of the lanes, vehicles on top
//! of everything.

use bevy_ecs::prelude::Component;

/// Rendering order hint for 2D drawing. Higher values are drawn later.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ZIndex(pub i32);

impl ZIndex {
    pub const LANES: ZIndex = ZIndex(0);
    pub const SIGNALS: ZIndex = ZIndex(1);
    pub const VEHICLES: ZIndex = ZIndex(2);
}
