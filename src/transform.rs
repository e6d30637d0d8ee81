//! World→screen coordinate transform.
//!
//! The simulator reports positions in meters with the Y axis pointing up. The
//! canvas uses pixels with the Y axis pointing down. [`WorldBounds`] fits the
//! bounding box of the static lane geometry inside the canvas (minus a
//! margin) with a single uniform scale, so the network keeps its aspect ratio.
//!
//! Bounds are computed once at startup and passed explicitly to every caller;
//! there is no process-wide transform state.
//!
//! ```text
//! screen_x = margin + (x - min_x) * scale
//! screen_y = canvas_height - (margin + (y - min_y) * scale)
//! ```

use crate::error::TransformError;

/// Point in simulation world coordinates (meters, Y up).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Point in canvas coordinates (pixels, Y down).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rectangle and scale mapping the world onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    /// Pixels per world unit, identical on both axes.
    pub scale: f64,
    pub margin: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl WorldBounds {
    /// Fit the bounding box of `points` inside the canvas.
    ///
    /// An axis with zero world extent does not constrain the scale. When both
    /// axes are degenerate (a single distinct point) the scale falls back to
    /// `1.0`.
    pub fn compute(
        points: impl IntoIterator<Item = WorldPoint>,
        canvas_width: f64,
        canvas_height: f64,
        margin: f64,
    ) -> Result<Self, TransformError> {
        let mut iter = points.into_iter();
        let first = iter.next().ok_or(TransformError::EmptyGeometry)?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        let world_w = max_x - min_x;
        let world_h = max_y - min_y;
        let available_w = canvas_width - 2.0 * margin;
        let available_h = canvas_height - 2.0 * margin;

        let scale_x = (world_w > 0.0).then(|| available_w / world_w);
        let scale_y = (world_h > 0.0).then(|| available_h / world_h);
        let scale = match (scale_x, scale_y) {
            (Some(sx), Some(sy)) => sx.min(sy),
            (Some(s), None) | (None, Some(s)) => s,
            (None, None) => 1.0,
        };

        Ok(Self {
            min_x,
            max_x,
            min_y,
            max_y,
            scale,
            margin,
            canvas_width,
            canvas_height,
        })
    }

    /// Convert a world point to canvas pixels, flipping the Y axis.
    pub fn world_to_screen(&self, point: WorldPoint) -> ScreenPoint {
        let rel_x = point.x - self.min_x;
        let rel_y = point.y - self.min_y;
        ScreenPoint {
            x: self.margin + rel_x * self.scale,
            y: self.canvas_height - (self.margin + rel_y * self.scale),
        }
    }

    /// Convert every vertex of a polyline.
    pub fn polyline_to_screen(&self, polyline: &[WorldPoint]) -> Vec<ScreenPoint> {
        polyline.iter().map(|p| self.world_to_screen(*p)).collect()
    }
}

/// Compute bounds from static geometry. See [`WorldBounds::compute`].
pub fn compute_bounds(
    points: impl IntoIterator<Item = WorldPoint>,
    canvas_width: f64,
    canvas_height: f64,
    margin: f64,
) -> Result<WorldBounds, TransformError> {
    WorldBounds::compute(points, canvas_width, canvas_height, margin)
}

/// Convert a world point using bounds that may not exist yet.
///
/// Returns [`TransformError::BoundsNotReady`] when `bounds` is `None`, which
/// means the transform was used before startup finished.
pub fn world_to_screen(
    point: WorldPoint,
    bounds: Option<&WorldBounds>,
) -> Result<ScreenPoint, TransformError> {
    bounds
        .map(|b| b.world_to_screen(point))
        .ok_or(TransformError::BoundsNotReady)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn sample_bounds() -> WorldBounds {
        compute_bounds(
            [WorldPoint::new(0.0, 0.0), WorldPoint::new(100.0, 50.0)],
            400.0,
            300.0,
            20.0,
        )
        .unwrap()
    }

    #[test]
    fn test_bounds_use_smaller_axis_scale() {
        let b = sample_bounds();
        assert!(approx_eq(b.min_x, 0.0));
        assert!(approx_eq(b.max_x, 100.0));
        assert!(approx_eq(b.min_y, 0.0));
        assert!(approx_eq(b.max_y, 50.0));
        // min(360 / 100, 260 / 50)
        assert!(approx_eq(b.scale, 3.6));
    }

    #[test]
    fn test_world_origin_maps_to_bottom_left_margin() {
        let p = sample_bounds().world_to_screen(WorldPoint::new(0.0, 0.0));
        assert!(approx_eq(p.x, 20.0));
        assert!(approx_eq(p.y, 280.0));
    }

    #[test]
    fn test_world_max_corner() {
        let p = sample_bounds().world_to_screen(WorldPoint::new(100.0, 50.0));
        assert!(approx_eq(p.x, 380.0));
        assert!(approx_eq(p.y, 100.0));
    }

    #[test]
    fn test_increasing_world_y_decreases_screen_y() {
        let b = sample_bounds();
        let mut last = f64::INFINITY;
        for i in 0..=10 {
            let p = b.world_to_screen(WorldPoint::new(42.0, i as f64 * 5.0));
            assert!(p.y < last);
            last = p.y;
        }
    }

    #[test]
    fn test_empty_geometry_is_rejected() {
        let err = compute_bounds(std::iter::empty(), 400.0, 300.0, 20.0).unwrap_err();
        assert_eq!(err, TransformError::EmptyGeometry);
    }

    #[test]
    fn test_transform_before_bounds_is_an_error() {
        let err = world_to_screen(WorldPoint::new(1.0, 1.0), None).unwrap_err();
        assert_eq!(err, TransformError::BoundsNotReady);

        let b = sample_bounds();
        let p = world_to_screen(WorldPoint::new(0.0, 0.0), Some(&b)).unwrap();
        assert!(approx_eq(p.x, 20.0));
    }

    #[test]
    fn test_bounds_ignore_point_order_and_negative_coords() {
        let b = compute_bounds(
            [
                WorldPoint::new(10.0, -5.0),
                WorldPoint::new(-30.0, 15.0),
                WorldPoint::new(0.0, 0.0),
            ],
            200.0,
            200.0,
            0.0,
        )
        .unwrap();
        assert!(approx_eq(b.min_x, -30.0));
        assert!(approx_eq(b.max_x, 10.0));
        assert!(approx_eq(b.min_y, -5.0));
        assert!(approx_eq(b.max_y, 15.0));
        // min(200 / 40, 200 / 20)
        assert!(approx_eq(b.scale, 5.0));
    }

    #[test]
    fn test_flat_geometry_is_scaled_by_the_other_axis() {
        let b = compute_bounds(
            [WorldPoint::new(0.0, 10.0), WorldPoint::new(50.0, 10.0)],
            120.0,
            80.0,
            10.0,
        )
        .unwrap();
        assert!(approx_eq(b.scale, 2.0));
        let p = b.world_to_screen(WorldPoint::new(50.0, 10.0));
        assert!(approx_eq(p.x, 110.0));
        assert!(approx_eq(p.y, 70.0));
    }

    #[test]
    fn test_single_point_uses_unit_scale() {
        let b = compute_bounds([WorldPoint::new(3.0, 4.0)], 100.0, 100.0, 5.0).unwrap();
        assert!(approx_eq(b.scale, 1.0));
        let p = b.world_to_screen(WorldPoint::new(3.0, 4.0));
        assert!(approx_eq(p.x, 5.0));
        assert!(approx_eq(p.y, 95.0));
    }

    #[test]
    fn test_polyline_conversion_keeps_vertex_order() {
        let b = sample_bounds();
        let line = [WorldPoint::new(0.0, 0.0), WorldPoint::new(100.0, 50.0)];
        let screen = b.polyline_to_screen(&line);
        assert_eq!(screen.len(), 2);
        assert!(approx_eq(screen[0].x, 20.0));
        assert!(approx_eq(screen[1].y, 100.0));
    }
}
