//! Traffic-light visual component.
//!
//! A [`SignalLamp`] is a filled circle centered on the entity's
//! [`ScreenPosition`](super::screenposition::ScreenPosition). Its color is
//! refreshed every tick from the junction's signal state.

use bevy_ecs::prelude::Component;

use crate::sync::trafficlights::SignalColor;

#[derive(Component, Clone, Debug, PartialEq)]
pub struct SignalLamp {
    /// Simulator id of the traffic light.
    pub id: String,
    pub color: SignalColor,
    /// Radius in pixels.
    pub radius: f64,
}
