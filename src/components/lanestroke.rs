//! Lane polyline component.
//!
//! Lanes are static: their screen polyline is computed once when the lane
//! layer is built and never updated by the tick loop.

use bevy_ecs::prelude::Component;

use crate::transform::ScreenPoint;

#[derive(Component, Clone, Debug, PartialEq)]
pub struct LaneStroke {
    /// Vertices in canvas pixels, in drawing order.
    pub points: Vec<ScreenPoint>,
    /// Stroke width in pixels.
    pub width: f64,
}

impl LaneStroke {
    /// Consecutive vertex pairs, one per drawn segment.
    pub fn segments(&self) -> impl Iterator<Item = (ScreenPoint, ScreenPoint)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }
}
