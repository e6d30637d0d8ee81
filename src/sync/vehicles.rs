//! Vehicle synchronization.
//!
//! [`VehicleSync`] keeps one visual per live vehicle. Attributes are fetched
//! every tick; the simulator's type string is resolved once, at fetch time,
//! into a [`VehicleKind`] that selects the size of the drawn box.
//!
//! Spawning goes the other way: [`VehicleSync::request_spawn`] submits a
//! creation command and returns. The new vehicle is drawn only after the
//! simulator reports it in a later live-id snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

use log::{info, warn};

use crate::error::{FetchError, SimulatorError, SpawnSubmissionError};
use crate::reconcile::{ReconcileOps, ReconcileReport, ReconciliationSet, reconcile};
use crate::simulator::{EntityKind, Simulator};
use crate::sink::{RenderingSink, VehicleVisual, Visual};
use crate::transform::{WorldBounds, WorldPoint};

/// Process-wide counter behind spawned vehicle ids.
static VEHICLE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Next process-unique vehicle id, `veh_1`, `veh_2`, ...
pub fn next_vehicle_id() -> String {
    format!("veh_{}", VEHICLE_COUNTER.fetch_add(1, Ordering::Relaxed) + 1)
}

/// Size profile of a drawn vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VehicleKind {
    #[default]
    Car,
    Bus,
    Truck,
}

impl VehicleKind {
    pub const ALL: [VehicleKind; 3] = [VehicleKind::Car, VehicleKind::Bus, VehicleKind::Truck];

    /// Resolve a simulator type id. Unknown types are drawn as cars.
    pub fn from_type_id(type_id: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|k| k.type_id().eq_ignore_ascii_case(type_id))
            .unwrap_or(VehicleKind::Car)
    }

    /// Type id used when submitting spawns to the simulator.
    pub fn type_id(&self) -> &'static str {
        match self {
            VehicleKind::Car => "car",
            VehicleKind::Bus => "bus",
            VehicleKind::Truck => "truck",
        }
    }

    /// `(width, height)` in pixels.
    pub fn size(&self) -> (f64, f64) {
        match self {
            VehicleKind::Car => (20.0, 30.0),
            VehicleKind::Bus => (20.0, 50.0),
            VehicleKind::Truck => (20.0, 35.0),
        }
    }

    pub fn random() -> Self {
        Self::ALL[fastrand::usize(..Self::ALL.len())]
    }
}

/// Attributes fetched for one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleAttributes {
    pub position: WorldPoint,
    pub rotation_degrees: f64,
    pub kind: VehicleKind,
}

/// Vehicle capability set for one reconciliation pass.
struct VehicleOps<'a, Sim: ?Sized, S> {
    sim: &'a mut Sim,
    sink: &'a mut S,
    bounds: &'a WorldBounds,
}

impl<Sim, S> VehicleOps<'_, Sim, S>
where
    Sim: Simulator + ?Sized,
    S: RenderingSink,
{
    fn visual(&self, id: &str, attrs: &VehicleAttributes) -> Visual {
        let center = self.bounds.world_to_screen(attrs.position);
        Visual::Vehicle(VehicleVisual::centered(
            id,
            attrs.kind,
            center,
            attrs.rotation_degrees,
        ))
    }
}

impl<Sim, S> ReconcileOps for VehicleOps<'_, Sim, S>
where
    Sim: Simulator + ?Sized,
    S: RenderingSink,
{
    type Handle = S::Handle;
    type Attrs = VehicleAttributes;

    fn fetch_attributes(
        &mut self,
        id: &str,
        previous: Option<&VehicleAttributes>,
    ) -> Result<VehicleAttributes, FetchError> {
        let raw = self.sim.fetch_attributes(EntityKind::Vehicle, id)?;
        // A vehicle's type never changes; keep the kind resolved at creation.
        let kind = previous
            .map(|p| p.kind)
            .unwrap_or_else(|| VehicleKind::from_type_id(&raw.type_or_state));
        Ok(VehicleAttributes {
            position: raw.position,
            rotation_degrees: raw.rotation_degrees,
            kind,
        })
    }

    fn create_visual(&mut self, id: &str, attrs: &VehicleAttributes) -> S::Handle {
        let visual = self.visual(id, attrs);
        self.sink.create_visual(&visual)
    }

    fn update_visual(&mut self, id: &str, handle: &S::Handle, attrs: &VehicleAttributes) {
        let visual = self.visual(id, attrs);
        self.sink.update_visual(handle, &visual);
    }

    fn destroy_visual(&mut self, handle: S::Handle) {
        self.sink.destroy_visual(handle);
    }
}

/// Tracked vehicles and their visuals.
#[derive(Debug)]
pub struct VehicleSync<H> {
    tracked: ReconciliationSet<H, VehicleAttributes>,
}

impl<H> Default for VehicleSync<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> VehicleSync<H> {
    pub fn new() -> Self {
        Self {
            tracked: ReconciliationSet::new(EntityKind::Vehicle),
        }
    }

    pub fn tracked(&self) -> &ReconciliationSet<H, VehicleAttributes> {
        &self.tracked
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// One reconciliation pass against the simulator's current vehicles.
    ///
    /// Fails only when the live-id listing itself fails; tracked state is
    /// left untouched in that case.
    pub fn sync<Sim, S>(
        &mut self,
        sim: &mut Sim,
        sink: &mut S,
        bounds: &WorldBounds,
    ) -> Result<ReconcileReport, SimulatorError>
    where
        Sim: Simulator + ?Sized,
        S: RenderingSink<Handle = H>,
    {
        let live = sim.live_ids(EntityKind::Vehicle)?;
        let mut ops = VehicleOps { sim, sink, bounds };
        Ok(reconcile(&mut self.tracked, live, &mut ops))
    }

    /// Destroy every vehicle visual, e.g. before shutting down.
    pub fn clear<S: RenderingSink<Handle = H>>(&mut self, sink: &mut S) -> usize {
        self.tracked.clear(|handle| sink.destroy_visual(handle))
    }

    /// Submit a fire-and-forget spawn of a `kind` vehicle on `route_id`.
    ///
    /// Returns the generated id. Nothing is tracked here: the vehicle shows
    /// up through the normal create path once the simulator lists it.
    /// Submission failures are logged and returned; they are never retried.
    pub fn request_spawn<Sim>(
        &self,
        sim: &mut Sim,
        kind: VehicleKind,
        route_id: &str,
    ) -> Result<String, SpawnSubmissionError>
    where
        Sim: Simulator + ?Sized,
    {
        let id = next_vehicle_id();
        match sim.spawn(EntityKind::Vehicle, &id, kind.type_id(), route_id) {
            Ok(()) => {
                info!("Requested vehicle {} ({}) on route {}", id, kind.type_id(), route_id);
                Ok(id)
            }
            Err(source) => {
                let err = SpawnSubmissionError {
                    id,
                    route_id: route_id.to_string(),
                    source,
                };
                warn!("{}", err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::EntityAttributes;
    use crate::transform::ScreenPoint;
    use rustc_hash::FxHashMap;
    use std::path::Path;

    /// Vehicles-only simulator with directly editable state.
    #[derive(Default)]
    struct VehicleTable {
        vehicles: FxHashMap<String, EntityAttributes>,
        spawned: Vec<(String, String, String)>,
        reject_spawns: bool,
    }

    impl VehicleTable {
        fn put(&mut self, id: &str, x: f64, y: f64, angle: f64, type_id: &str) {
            self.vehicles.insert(
                id.to_string(),
                EntityAttributes {
                    position: WorldPoint::new(x, y),
                    rotation_degrees: angle,
                    type_or_state: type_id.to_string(),
                },
            );
        }
    }

    impl Simulator for VehicleTable {
        fn start(&mut self, _: &Path) -> Result<(), SimulatorError> {
            Ok(())
        }
        fn stop(&mut self) {}
        fn is_active(&self) -> bool {
            true
        }
        fn step(&mut self) -> Result<(), SimulatorError> {
            Ok(())
        }
        fn live_ids(&mut self, kind: EntityKind) -> Result<Vec<String>, SimulatorError> {
            assert_eq!(kind, EntityKind::Vehicle);
            Ok(self.vehicles.keys().cloned().collect())
        }
        fn fetch_attributes(&mut self, kind: EntityKind, id: &str) -> Result<EntityAttributes, FetchError> {
            self.vehicles
                .get(id)
                .cloned()
                .ok_or_else(|| FetchError::new(kind, id, "gone"))
        }
        fn lane_shapes(&mut self) -> Result<Vec<Vec<WorldPoint>>, SimulatorError> {
            Ok(Vec::new())
        }
        fn spawn(&mut self, _: EntityKind, id: &str, type_tag: &str, route_id: &str) -> Result<(), SimulatorError> {
            if self.reject_spawns {
                return Err(SimulatorError::UnknownRoute(route_id.to_string()));
            }
            self.spawned
                .push((id.to_string(), type_tag.to_string(), route_id.to_string()));
            Ok(())
        }
    }

    /// Sink keeping the latest visual per handle.
    #[derive(Default)]
    struct MemorySink {
        next: u32,
        visuals: FxHashMap<u32, Visual>,
    }

    impl RenderingSink for MemorySink {
        type Handle = u32;
        fn create_visual(&mut self, visual: &Visual) -> u32 {
            self.next += 1;
            self.visuals.insert(self.next, visual.clone());
            self.next
        }
        fn update_visual(&mut self, handle: &u32, visual: &Visual) {
            self.visuals.insert(*handle, visual.clone());
        }
        fn destroy_visual(&mut self, handle: u32) {
            self.visuals.remove(&handle);
        }
    }

    fn bounds() -> WorldBounds {
        WorldBounds::compute(
            [WorldPoint::new(0.0, 0.0), WorldPoint::new(100.0, 50.0)],
            400.0,
            300.0,
            20.0,
        )
        .unwrap()
    }

    fn vehicle_visual(sink: &MemorySink, handle: u32) -> VehicleVisual {
        match sink.visuals.get(&handle) {
            Some(Visual::Vehicle(v)) => v.clone(),
            other => panic!("expected a vehicle visual, got {:?}", other),
        }
    }

    #[test]
    fn test_kind_resolution_defaults_to_car() {
        assert_eq!(VehicleKind::from_type_id("bus"), VehicleKind::Bus);
        assert_eq!(VehicleKind::from_type_id("TRUCK"), VehicleKind::Truck);
        assert_eq!(VehicleKind::from_type_id("car"), VehicleKind::Car);
        assert_eq!(VehicleKind::from_type_id("motorcycle"), VehicleKind::Car);
        assert_eq!(VehicleKind::from_type_id(""), VehicleKind::Car);
    }

    #[test]
    fn test_created_visual_is_centered_on_converted_position() {
        let mut sim = VehicleTable::default();
        sim.put("v1", 0.0, 0.0, 30.0, "truck");
        let mut sink = MemorySink::default();
        let mut sync = VehicleSync::new();

        let report = sync.sync(&mut sim, &mut sink, &bounds()).unwrap();
        assert_eq!(report.created, vec!["v1".to_string()]);

        let handle = *sync.tracked().get("v1").unwrap().handle();
        let v = vehicle_visual(&sink, handle);
        assert_eq!(v.kind, VehicleKind::Truck);
        assert_eq!(v.center, ScreenPoint::new(20.0, 280.0));
        assert_eq!(v.top_left, ScreenPoint::new(10.0, 262.5));
        assert_eq!(v.rotation_degrees, 30.0);
    }

    #[test]
    fn test_update_moves_and_rotates() {
        let mut sim = VehicleTable::default();
        sim.put("v1", 0.0, 0.0, 0.0, "car");
        let mut sink = MemorySink::default();
        let mut sync = VehicleSync::new();
        sync.sync(&mut sim, &mut sink, &bounds()).unwrap();

        sim.put("v1", 100.0, 50.0, 180.0, "car");
        let report = sync.sync(&mut sim, &mut sink, &bounds()).unwrap();
        assert_eq!(report.updated, vec!["v1".to_string()]);

        let handle = *sync.tracked().get("v1").unwrap().handle();
        let v = vehicle_visual(&sink, handle);
        assert_eq!(v.id, "v1");
        assert!((v.center.x - 380.0).abs() < 1e-9);
        assert!((v.center.y - 100.0).abs() < 1e-9);
        assert_eq!(v.rotation_degrees, 180.0);
        assert_eq!(
            sync.tracked().get("v1").unwrap().last_attributes().rotation_degrees,
            180.0
        );
    }

    #[test]
    fn test_vanished_vehicle_is_destroyed() {
        let mut sim = VehicleTable::default();
        sim.put("v1", 0.0, 0.0, 0.0, "car");
        sim.put("v2", 1.0, 0.0, 0.0, "bus");
        let mut sink = MemorySink::default();
        let mut sync = VehicleSync::new();
        sync.sync(&mut sim, &mut sink, &bounds()).unwrap();

        sim.vehicles.remove("v1");
        let report = sync.sync(&mut sim, &mut sink, &bounds()).unwrap();
        assert_eq!(report.destroyed, vec!["v1".to_string()]);
        assert_eq!(sync.len(), 1);
        assert_eq!(sink.visuals.len(), 1);
    }

    #[test]
    fn test_clear_needs_only_the_sink() {
        let mut sim = VehicleTable::default();
        sim.put("v1", 0.0, 0.0, 0.0, "car");
        sim.put("v2", 1.0, 0.0, 0.0, "bus");
        let mut sink = MemorySink::default();
        let mut sync = VehicleSync::new();
        sync.sync(&mut sim, &mut sink, &bounds()).unwrap();

        assert_eq!(sync.clear(&mut sink), 2);
        assert!(sync.is_empty());
        assert!(sink.visuals.is_empty());
    }

    #[test]
    fn test_spawn_is_not_tracked_until_listed() {
        let mut sim = VehicleTable::default();
        let mut sink = MemorySink::default();
        let mut sync: VehicleSync<u32> = VehicleSync::new();

        let id = sync.request_spawn(&mut sim, VehicleKind::Bus, "r1").unwrap();
        assert!(id.starts_with("veh_"));
        assert_eq!(sim.spawned, vec![(id.clone(), "bus".to_string(), "r1".to_string())]);
        assert!(sync.is_empty());

        sim.put(&id, 5.0, 5.0, 0.0, "bus");
        let report = sync.sync(&mut sim, &mut sink, &bounds()).unwrap();
        assert_eq!(report.created, vec![id.clone()]);
        assert!(sync.tracked().contains(&id));
    }

    #[test]
    fn test_spawn_ids_are_unique() {
        let ids: Vec<String> = (0..50).map(|_| next_vehicle_id()).collect();
        let unique: std::collections::BTreeSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_rejected_spawn_is_reported() {
        let mut sim = VehicleTable {
            reject_spawns: true,
            ..Default::default()
        };
        let sync: VehicleSync<u32> = VehicleSync::new();
        let err = sync
            .request_spawn(&mut sim, VehicleKind::Car, "nowhere")
            .unwrap_err();
        assert_eq!(err.route_id, "nowhere");
        assert!(sim.spawned.is_empty());
    }
}
