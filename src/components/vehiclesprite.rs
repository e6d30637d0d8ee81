//! Vehicle visual component.
//!
//! A [`VehicleSprite`] is drawn as a `width × height` box centered on the
//! vehicle position and rotated by the entity's
//! [`Rotation`](super::rotation::Rotation). The entity's
//! [`ScreenPosition`](super::screenposition::ScreenPosition) holds the box's
//! top-left corner before rotation.

use bevy_ecs::prelude::Component;

use crate::sync::vehicles::VehicleKind;

#[derive(Component, Clone, Debug, PartialEq)]
pub struct VehicleSprite {
    /// Simulator id of the vehicle.
    pub id: String,
    pub kind: VehicleKind,
    /// Width in pixels.
    pub width: f64,
    /// Height (length along the heading) in pixels.
    pub height: f64,
}
