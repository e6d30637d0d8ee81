//! Static lane geometry.
//!
//! Lane shapes are read once at startup. They feed the world bounds and are
//! then drawn as light-gray polylines that stay untouched for the rest of the
//! run.

use log::{debug, info};

use crate::error::SimulatorError;
use crate::simulator::Simulator;
use crate::sink::{LaneVisual, RenderingSink, Visual};
use crate::transform::{ScreenPoint, WorldBounds, WorldPoint};

pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// Lane polylines in world space plus the visuals built from them.
#[derive(Debug)]
pub struct LaneLayer<H> {
    polylines: Vec<Vec<WorldPoint>>,
    handles: Vec<H>,
}

impl<H> LaneLayer<H> {
    pub fn from_polylines(polylines: Vec<Vec<WorldPoint>>) -> Self {
        Self {
            polylines,
            handles: Vec::new(),
        }
    }

    /// Query every lane shape from the simulator.
    pub fn load<Sim: Simulator + ?Sized>(sim: &mut Sim) -> Result<Self, SimulatorError> {
        let polylines = sim.lane_shapes()?;
        info!("Loaded {} lane shapes", polylines.len());
        Ok(Self::from_polylines(polylines))
    }

    /// Number of lane polylines, drawable or not.
    pub fn len(&self) -> usize {
        self.polylines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    /// Number of visuals currently owned by the layer.
    pub fn visual_count(&self) -> usize {
        self.handles.len()
    }

    /// Every lane vertex; the input for [`WorldBounds::compute`].
    pub fn points(&self) -> impl Iterator<Item = WorldPoint> + '_ {
        self.polylines.iter().flatten().copied()
    }

    fn screen_polylines(&self, bounds: &WorldBounds) -> Vec<Vec<ScreenPoint>> {
        self.polylines
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| bounds.polyline_to_screen(p))
            .collect()
    }

    /// Create one visual per non-empty lane. Does nothing if the layer was
    /// already built.
    pub fn build<S>(&mut self, sink: &mut S, bounds: &WorldBounds) -> usize
    where
        S: RenderingSink<Handle = H>,
    {
        if !self.handles.is_empty() {
            debug!("Lane layer already built, skipping");
            return 0;
        }
        for points in self.screen_polylines(bounds) {
            let visual = Visual::Lane(LaneVisual {
                points,
                stroke_width: DEFAULT_STROKE_WIDTH,
            });
            self.handles.push(sink.create_visual(&visual));
        }
        debug!("Built {} lane visuals", self.handles.len());
        self.handles.len()
    }

    /// Destroy every lane visual and build them again.
    pub fn rebuild<S>(&mut self, sink: &mut S, bounds: &WorldBounds) -> usize
    where
        S: RenderingSink<Handle = H>,
    {
        self.clear(sink);
        self.build(sink, bounds)
    }

    /// Re-read the shapes from the simulator. Existing visuals are kept until
    /// the next [`rebuild`](Self::rebuild).
    pub fn reload<Sim: Simulator + ?Sized>(&mut self, sim: &mut Sim) -> Result<(), SimulatorError> {
        self.polylines = sim.lane_shapes()?;
        Ok(())
    }

    /// Destroy every lane visual.
    pub fn clear<S>(&mut self, sink: &mut S) -> usize
    where
        S: RenderingSink<Handle = H>,
    {
        let count = self.handles.len();
        for handle in self.handles.drain(..) {
            sink.destroy_visual(handle);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Canvas {
        next: u32,
        lanes: Vec<(u32, LaneVisual)>,
    }

    impl RenderingSink for Canvas {
        type Handle = u32;
        fn create_visual(&mut self, visual: &Visual) -> u32 {
            let Visual::Lane(l) = visual else {
                panic!("not a lane");
            };
            self.next += 1;
            self.lanes.push((self.next, l.clone()));
            self.next
        }
        fn update_visual(&mut self, _: &u32, _: &Visual) {}
        fn destroy_visual(&mut self, handle: u32) {
            self.lanes.retain(|(h, _)| *h != handle);
        }
    }

    fn layer() -> LaneLayer<u32> {
        LaneLayer::from_polylines(vec![
            vec![WorldPoint::new(0.0, 0.0), WorldPoint::new(100.0, 0.0)],
            Vec::new(),
            vec![WorldPoint::new(50.0, 0.0), WorldPoint::new(50.0, 50.0)],
        ])
    }

    fn bounds(layer: &LaneLayer<u32>) -> WorldBounds {
        WorldBounds::compute(layer.points(), 400.0, 300.0, 20.0).unwrap()
    }

    #[test]
    fn test_points_cover_every_vertex() {
        let layer = layer();
        assert_eq!(layer.points().count(), 4);
        let b = bounds(&layer);
        assert_eq!(b.max_x, 100.0);
        assert_eq!(b.max_y, 50.0);
    }

    #[test]
    fn test_build_skips_empty_polylines() {
        let mut layer = layer();
        let b = bounds(&layer);
        let mut canvas = Canvas::default();
        assert_eq!(layer.build(&mut canvas, &b), 2);
        assert_eq!(canvas.lanes.len(), 2);
        assert_eq!(canvas.lanes[0].1.stroke_width, DEFAULT_STROKE_WIDTH);
        let first = &canvas.lanes[0].1.points;
        assert!((first[0].x - 20.0).abs() < 1e-9);
        assert!((first[0].y - 280.0).abs() < 1e-9);
    }

    #[test]
    fn test_build_is_one_shot() {
        let mut layer = layer();
        let b = bounds(&layer);
        let mut canvas = Canvas::default();
        layer.build(&mut canvas, &b);
        assert_eq!(layer.build(&mut canvas, &b), 0);
        assert_eq!(canvas.lanes.len(), 2);
        assert_eq!(layer.visual_count(), 2);
    }

    #[test]
    fn test_rebuild_and_clear() {
        let mut layer = layer();
        let b = bounds(&layer);
        let mut canvas = Canvas::default();
        layer.build(&mut canvas, &b);
        assert_eq!(layer.rebuild(&mut canvas, &b), 2);
        assert_eq!(canvas.lanes.len(), 2);
        assert!(canvas.lanes.iter().all(|(_, l)| !l.points.is_empty()));

        assert_eq!(layer.clear(&mut canvas), 2);
        assert!(canvas.lanes.is_empty());
        assert_eq!(layer.visual_count(), 0);
        assert_eq!(layer.len(), 3);
    }
}
