//! Screen-space position component.
//!
//! The [`ScreenPosition`] component stores where a visual is placed on the
//! canvas, in pixels with the Y axis pointing down. Vehicles store their
//! top-left corner here; traffic lights store their center.

use bevy_ecs::prelude::Component;

use crate::transform::ScreenPoint;

/// Canvas position of a visual entity.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenPosition {
    /// Coordinates in canvas pixels.
    pub pos: ScreenPoint,
}

impl ScreenPosition {
    /// Create a ScreenPosition from an existing point.
    pub fn from_point(pos: ScreenPoint) -> Self {
        Self { pos }
    }

    /// X coordinate.
    pub fn x(&self) -> f64 {
        self.pos.x
    }

    /// Y coordinate.
    pub fn y(&self) -> f64 {
        self.pos.y
    }

    /// Set the entire position.
    pub fn set_pos(&mut self, pos: ScreenPoint) {
        self.pos = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_from_point_keeps_coordinates() {
        let pos = ScreenPosition::from_point(ScreenPoint::new(10.0, 20.0));
        assert!(approx_eq(pos.x(), 10.0));
        assert!(approx_eq(pos.y(), 20.0));
    }

    #[test]
    fn test_default_is_zero() {
        let pos = ScreenPosition::default();
        assert!(approx_eq(pos.x(), 0.0));
        assert!(approx_eq(pos.y(), 0.0));
    }

    #[test]
    fn test_set_pos_replaces_both_axes() {
        let mut pos = ScreenPosition::from_point(ScreenPoint::new(1.0, 2.0));
        pos.set_pos(ScreenPoint::new(100.0, 200.0));
        assert!(approx_eq(pos.x(), 100.0));
        assert!(approx_eq(pos.y(), 200.0));
    }
}
