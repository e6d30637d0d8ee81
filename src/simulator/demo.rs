//! Self-contained demo simulator.
//!
//! [`DemoSimulator`] implements [`Simulator`] over a [`NetworkDefinition`]:
//! vehicles drive along their route polyline at their type's maximum speed,
//! keep a minimum gap to the vehicle ahead, and wait at the stop line while
//! the controlling signal is not green. Traffic lights cycle through their
//! phases. It is intentionally simple; it exists so the viewer can run
//! without an external simulator.
//!
//! # Step Order
//!
//! 1. Advance traffic-light phases
//! 2. Queue flow departures due this step
//! 3. Move vehicles (front to back on every route)
//! 4. Insert queued departures whose route start is clear
//! 5. Remove vehicles that reached the end of their route

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

use log::{debug, info};
use rustc_hash::FxHashMap;

use super::network::{NetworkDefinition, SignalStopDef, TrafficLightDef};
use super::{EntityAttributes, EntityKind, Simulator};
use crate::error::{FetchError, SimulatorError};
use crate::transform::WorldPoint;

/// Route polyline with cumulative segment lengths.
#[derive(Debug, Clone)]
struct RoutePath {
    points: Vec<WorldPoint>,
    cumulative: Vec<f64>,
    signal: Option<SignalStopDef>,
}

impl RoutePath {
    fn build(network: &NetworkDefinition, lanes: &[String], signal: Option<SignalStopDef>) -> Self {
        let mut points: Vec<WorldPoint> = Vec::new();
        for lane_id in lanes {
            let Some(lane) = network.lanes.iter().find(|l| &l.id == lane_id) else {
                continue;
            };
            for p in lane.points() {
                if points.last() != Some(&p) {
                    points.push(p);
                }
            }
        }
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                let prev = points[i - 1];
                total += (p.x - prev.x).hypot(p.y - prev.y);
            }
            cumulative.push(total);
        }
        Self {
            points,
            cumulative,
            signal,
        }
    }

    fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Position and heading at `distance` along the route.
    ///
    /// Heading follows the navigation convention: 0° points north (+Y),
    /// angles grow clockwise.
    fn locate(&self, distance: f64) -> (WorldPoint, f64) {
        match self.points.len() {
            0 => return (WorldPoint::default(), 0.0),
            1 => return (self.points[0], 0.0),
            _ => {}
        }
        let d = distance.clamp(0.0, self.length());
        let seg = self
            .cumulative
            .windows(2)
            .position(|w| d <= w[1])
            .unwrap_or(self.points.len() - 2);
        let (a, b) = (self.points[seg], self.points[seg + 1]);
        let seg_len = self.cumulative[seg + 1] - self.cumulative[seg];
        let t = if seg_len > 0.0 {
            (d - self.cumulative[seg]) / seg_len
        } else {
            0.0
        };
        let pos = WorldPoint::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
        let heading = (b.x - a.x).atan2(b.y - a.y).to_degrees().rem_euclid(360.0);
        (pos, heading)
    }
}

#[derive(Debug, Clone)]
struct DemoVehicle {
    type_id: String,
    route: usize,
    /// Front bumper position along the route.
    distance: f64,
    max_speed: f64,
    length: f64,
}

#[derive(Debug, Clone)]
struct DemoTrafficLight {
    def: TrafficLightDef,
    phase: usize,
    time_in_phase: f64,
}

impl DemoTrafficLight {
    fn state(&self) -> &str {
        &self.def.phases[self.phase].state
    }

    fn advance(&mut self, dt: f64) {
        self.time_in_phase += dt;
        loop {
            let duration = self.def.phases[self.phase].duration;
            if duration <= 0.0 || self.time_in_phase < duration {
                break;
            }
            self.time_in_phase -= duration;
            self.phase = (self.phase + 1) % self.def.phases.len();
        }
    }
}

#[derive(Debug, Clone)]
struct PendingDeparture {
    id: String,
    type_id: String,
    route: usize,
}

/// In-process traffic simulator driven by a JSON network description.
#[derive(Debug, Default)]
pub struct DemoSimulator {
    network: Option<NetworkDefinition>,
    routes: Vec<RoutePath>,
    route_index: FxHashMap<String, usize>,
    lights: BTreeMap<String, DemoTrafficLight>,
    vehicles: BTreeMap<String, DemoVehicle>,
    pending: VecDeque<PendingDeparture>,
    flow_counters: FxHashMap<String, u64>,
    step_count: u64,
    time: f64,
}

impl DemoSimulator {
    /// Create an inactive simulator. Call [`Simulator::start`] to load a network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an active simulator from an already parsed network.
    pub fn from_network(network: NetworkDefinition) -> Self {
        let mut sim = Self::new();
        sim.install(network);
        sim
    }

    fn install(&mut self, network: NetworkDefinition) {
        self.routes.clear();
        self.route_index.clear();
        for route in &network.routes {
            self.route_index
                .insert(route.id.clone(), self.routes.len());
            self.routes
                .push(RoutePath::build(&network, &route.lanes, route.signal.clone()));
        }
        self.lights = network
            .traffic_lights
            .iter()
            .map(|def| {
                (
                    def.id.clone(),
                    DemoTrafficLight {
                        def: def.clone(),
                        phase: 0,
                        time_in_phase: 0.0,
                    },
                )
            })
            .collect();
        self.vehicles.clear();
        self.pending.clear();
        self.flow_counters.clear();
        self.step_count = 0;
        self.time = 0.0;
        self.network = Some(network);
    }

    /// Number of executed steps since start.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Simulated seconds since start.
    pub fn time(&self) -> f64 {
        self.time
    }

    fn network(&self) -> Result<&NetworkDefinition, SimulatorError> {
        self.network.as_ref().ok_or(SimulatorError::Inactive)
    }

    /// Whether the signal controlling `stop` currently lets vehicles pass.
    fn signal_allows(lights: &BTreeMap<String, DemoTrafficLight>, stop: &SignalStopDef) -> bool {
        lights
            .get(&stop.tls)
            .and_then(|tl| tl.state().chars().nth(stop.link))
            .is_some_and(|c| c.eq_ignore_ascii_case(&'g'))
    }

    fn queue_flow_departures(&mut self) -> Result<(), SimulatorError> {
        let step = self.step_count;
        let mut due = Vec::new();
        for flow in &self.network()?.flows {
            if step % flow.period == 0 {
                due.push((flow.id.clone(), flow.vehicle_type.clone(), flow.route.clone()));
            }
        }
        for (flow_id, type_id, route_id) in due {
            let counter = self.flow_counters.entry(flow_id.clone()).or_insert(0);
            let id = format!("{}.{}", flow_id, counter);
            *counter += 1;
            if let Some(&route) = self.route_index.get(&route_id) {
                self.pending.push_back(PendingDeparture { id, type_id, route });
            }
        }
        Ok(())
    }

    fn move_vehicles(&mut self, dt: f64, min_gap: f64) {
        let mut order: Vec<(usize, f64, String)> = self
            .vehicles
            .iter()
            .map(|(id, v)| (v.route, v.distance, id.clone()))
            .collect();
        order.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.total_cmp(&a.1)));

        let mut leader_rear: Option<(usize, f64)> = None;
        for (route_idx, _, id) in order {
            let route = &self.routes[route_idx];
            let blocked_at = route
                .signal
                .as_ref()
                .filter(|stop| !Self::signal_allows(&self.lights, stop))
                .map(|stop| stop.stop_at);
            let Some(vehicle) = self.vehicles.get_mut(&id) else {
                continue;
            };

            let mut target = vehicle.distance + vehicle.max_speed * dt;
            if let Some((leader_route, rear)) = leader_rear {
                if leader_route == route_idx {
                    target = target.min(rear - min_gap);
                }
            }
            if let Some(stop_at) = blocked_at {
                if vehicle.distance <= stop_at {
                    target = target.min(stop_at);
                }
            }
            vehicle.distance = target.max(vehicle.distance);
            leader_rear = Some((route_idx, vehicle.distance - vehicle.length));
        }
    }

    fn insert_departures(&mut self, min_gap: f64) -> Result<(), SimulatorError> {
        let mut waiting = VecDeque::new();
        while let Some(dep) = self.pending.pop_front() {
            let (max_speed, length) = {
                let network = self.network()?;
                match network.vehicle_types.iter().find(|t| t.id == dep.type_id) {
                    Some(t) => (t.max_speed, t.length),
                    None => continue,
                }
            };
            let start_clear = self
                .vehicles
                .values()
                .filter(|v| v.route == dep.route)
                .all(|v| v.distance - v.length >= min_gap);
            if start_clear {
                debug!("Inserted vehicle {} on route #{}", dep.id, dep.route);
                self.vehicles.insert(
                    dep.id,
                    DemoVehicle {
                        type_id: dep.type_id,
                        route: dep.route,
                        distance: 0.0,
                        max_speed,
                        length,
                    },
                );
            } else {
                waiting.push_back(dep);
            }
        }
        self.pending = waiting;
        Ok(())
    }

    fn remove_arrived(&mut self) {
        let routes = &self.routes;
        self.vehicles
            .retain(|_, v| v.distance < routes[v.route].length());
    }
}

impl Simulator for DemoSimulator {
    fn start(&mut self, config_path: &Path) -> Result<(), SimulatorError> {
        if self.is_active() {
            info!("Demo simulator already active, ignoring start");
            return Ok(());
        }
        let network = NetworkDefinition::load(config_path)?;
        info!(
            "Loaded network {:?}: {} lanes, {} routes, {} traffic lights",
            config_path,
            network.lanes.len(),
            network.routes.len(),
            network.traffic_lights.len()
        );
        self.install(network);
        Ok(())
    }

    fn stop(&mut self) {
        if !self.is_active() {
            return;
        }
        info!("Stopping demo simulator after {} steps", self.step_count);
        *self = Self::new();
    }

    fn is_active(&self) -> bool {
        self.network.is_some()
    }

    fn step_length(&self) -> f64 {
        self.network
            .as_ref()
            .map_or(1.0, |network| network.step_length)
    }

    fn step(&mut self) -> Result<(), SimulatorError> {
        let (dt, min_gap) = {
            let network = self.network()?;
            (network.step_length, network.min_gap)
        };
        self.step_count += 1;
        self.time += dt;

        for light in self.lights.values_mut() {
            light.advance(dt);
        }
        self.queue_flow_departures()?;
        self.move_vehicles(dt, min_gap);
        self.insert_departures(min_gap)?;
        self.remove_arrived();
        Ok(())
    }

    fn live_ids(&mut self, kind: EntityKind) -> Result<Vec<String>, SimulatorError> {
        self.network()?;
        Ok(match kind {
            EntityKind::Vehicle => self.vehicles.keys().cloned().collect(),
            EntityKind::TrafficLight => self.lights.keys().cloned().collect(),
        })
    }

    fn fetch_attributes(
        &mut self,
        kind: EntityKind,
        id: &str,
    ) -> Result<EntityAttributes, FetchError> {
        if !self.is_active() {
            return Err(FetchError::new(kind, id, "simulator is not active"));
        }
        match kind {
            EntityKind::Vehicle => {
                let v = self
                    .vehicles
                    .get(id)
                    .ok_or_else(|| FetchError::new(kind, id, "no such vehicle"))?;
                let (position, rotation_degrees) = self.routes[v.route].locate(v.distance);
                Ok(EntityAttributes {
                    position,
                    rotation_degrees,
                    type_or_state: v.type_id.clone(),
                })
            }
            EntityKind::TrafficLight => {
                let tl = self
                    .lights
                    .get(id)
                    .ok_or_else(|| FetchError::new(kind, id, "no such traffic light"))?;
                let [x, y] = tl.def.position;
                Ok(EntityAttributes {
                    position: WorldPoint::new(x, y),
                    rotation_degrees: 0.0,
                    type_or_state: tl.state().to_string(),
                })
            }
        }
    }

    fn signal_state(&mut self, id: &str) -> Result<String, FetchError> {
        self.lights
            .get(id)
            .map(|tl| tl.state().to_string())
            .ok_or_else(|| FetchError::new(EntityKind::TrafficLight, id, "no such traffic light"))
    }

    fn lane_shapes(&mut self) -> Result<Vec<Vec<WorldPoint>>, SimulatorError> {
        Ok(self.network()?.lanes.iter().map(|l| l.points()).collect())
    }

    fn spawn(
        &mut self,
        kind: EntityKind,
        id: &str,
        type_tag: &str,
        route_id: &str,
    ) -> Result<(), SimulatorError> {
        let network = self.network()?;
        if kind != EntityKind::Vehicle {
            return Err(SimulatorError::NotSpawnable(kind));
        }
        if !network.vehicle_types.iter().any(|t| t.id == type_tag) {
            return Err(SimulatorError::UnknownVehicleType(type_tag.to_string()));
        }
        let route = *self
            .route_index
            .get(route_id)
            .ok_or_else(|| SimulatorError::UnknownRoute(route_id.to_string()))?;
        if self.vehicles.contains_key(id) || self.pending.iter().any(|p| p.id == id) {
            return Err(SimulatorError::DuplicateId(id.to_string()));
        }
        self.pending.push_back(PendingDeparture {
            id: id.to_string(),
            type_id: type_tag.to_string(),
            route,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    /// One straight 100 m eastbound route with a signal at 50 m.
    fn network(phases: &str) -> NetworkDefinition {
        NetworkDefinition::from_json(&format!(
            r#"{{
                "step_length": 1.0,
                "min_gap": 2.0,
                "lanes": [ {{ "id": "a", "shape": [[0, 0], [100, 0]] }} ],
                "routes": [ {{ "id": "r1", "lanes": ["a"],
                              "signal": {{ "tls": "J1", "link": 0, "stop_at": 50.0 }} }} ],
                "traffic_lights": [ {{ "id": "J1", "position": [50, 0], "phases": {} }} ],
                "vehicle_types": [ {{ "id": "car", "max_speed": 10.0, "length": 5.0 }} ]
            }}"#,
            phases
        ))
        .unwrap()
    }

    fn green() -> NetworkDefinition {
        network(r#"[ { "state": "G", "duration": 1000.0 } ]"#)
    }

    fn red() -> NetworkDefinition {
        network(r#"[ { "state": "r", "duration": 1000.0 } ]"#)
    }

    #[test]
    fn test_spawned_vehicle_appears_after_next_step() {
        let mut sim = DemoSimulator::from_network(green());
        sim.spawn(EntityKind::Vehicle, "v0", "car", "r1").unwrap();
        assert!(sim.live_ids(EntityKind::Vehicle).unwrap().is_empty());

        sim.step().unwrap();
        assert_eq!(sim.live_ids(EntityKind::Vehicle).unwrap(), vec!["v0".to_string()]);
        let attrs = sim.fetch_attributes(EntityKind::Vehicle, "v0").unwrap();
        assert_eq!(attrs.type_or_state, "car");
        assert!(approx_eq(attrs.position.x, 0.0));
        // Driving east.
        assert!(approx_eq(attrs.rotation_degrees, 90.0));
    }

    #[test]
    fn test_vehicle_moves_by_max_speed_per_step() {
        let mut sim = DemoSimulator::from_network(green());
        sim.spawn(EntityKind::Vehicle, "v0", "car", "r1").unwrap();
        sim.step().unwrap();
        sim.step().unwrap();
        sim.step().unwrap();
        let attrs = sim.fetch_attributes(EntityKind::Vehicle, "v0").unwrap();
        assert!(approx_eq(attrs.position.x, 20.0));
    }

    #[test]
    fn test_vehicle_waits_at_red_signal() {
        let mut sim = DemoSimulator::from_network(red());
        sim.spawn(EntityKind::Vehicle, "v0", "car", "r1").unwrap();
        for _ in 0..20 {
            sim.step().unwrap();
        }
        let attrs = sim.fetch_attributes(EntityKind::Vehicle, "v0").unwrap();
        assert!(approx_eq(attrs.position.x, 50.0));
    }

    #[test]
    fn test_vehicle_leaves_at_route_end() {
        let mut sim = DemoSimulator::from_network(green());
        sim.spawn(EntityKind::Vehicle, "v0", "car", "r1").unwrap();
        for _ in 0..11 {
            sim.step().unwrap();
        }
        assert!(sim.live_ids(EntityKind::Vehicle).unwrap().is_empty());
        assert!(sim.fetch_attributes(EntityKind::Vehicle, "v0").is_err());
    }

    #[test]
    fn test_follower_keeps_min_gap() {
        let mut sim = DemoSimulator::from_network(red());
        sim.spawn(EntityKind::Vehicle, "a", "car", "r1").unwrap();
        sim.step().unwrap();
        sim.spawn(EntityKind::Vehicle, "b", "car", "r1").unwrap();
        for _ in 0..30 {
            sim.step().unwrap();
        }
        let a = sim.fetch_attributes(EntityKind::Vehicle, "a").unwrap();
        let b = sim.fetch_attributes(EntityKind::Vehicle, "b").unwrap();
        assert!(approx_eq(a.position.x, 50.0));
        // Leader rear at 45, minus the 2 m gap.
        assert!(approx_eq(b.position.x, 43.0));
    }

    #[test]
    fn test_traffic_light_cycles_phases() {
        let mut sim = DemoSimulator::from_network(network(
            r#"[ { "state": "Gr", "duration": 2.0 }, { "state": "yr", "duration": 1.0 } ]"#,
        ));
        assert_eq!(sim.signal_state("J1").unwrap(), "Gr");
        sim.step().unwrap();
        assert_eq!(sim.signal_state("J1").unwrap(), "Gr");
        sim.step().unwrap();
        assert_eq!(sim.signal_state("J1").unwrap(), "yr");
        sim.step().unwrap();
        assert_eq!(sim.signal_state("J1").unwrap(), "Gr");
    }

    #[test]
    fn test_spawn_rejects_bad_commands() {
        let mut sim = DemoSimulator::from_network(green());
        assert!(matches!(
            sim.spawn(EntityKind::Vehicle, "v", "car", "nope"),
            Err(SimulatorError::UnknownRoute(_))
        ));
        assert!(matches!(
            sim.spawn(EntityKind::Vehicle, "v", "tram", "r1"),
            Err(SimulatorError::UnknownVehicleType(_))
        ));
        assert!(matches!(
            sim.spawn(EntityKind::TrafficLight, "v", "car", "r1"),
            Err(SimulatorError::NotSpawnable(_))
        ));
        sim.spawn(EntityKind::Vehicle, "v", "car", "r1").unwrap();
        assert!(matches!(
            sim.spawn(EntityKind::Vehicle, "v", "car", "r1"),
            Err(SimulatorError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_flows_emit_departures_every_period() {
        let mut net = green();
        net.flows.push(crate::simulator::network::FlowDef {
            id: "f".to_string(),
            vehicle_type: "car".to_string(),
            route: "r1".to_string(),
            period: 3,
        });
        let mut sim = DemoSimulator::from_network(net);
        for _ in 0..3 {
            sim.step().unwrap();
        }
        assert_eq!(sim.live_ids(EntityKind::Vehicle).unwrap(), vec!["f.0".to_string()]);
    }

    #[test]
    fn test_inactive_simulator_refuses_calls() {
        let mut sim = DemoSimulator::new();
        assert!(!sim.is_active());
        assert!(matches!(sim.step(), Err(SimulatorError::Inactive)));
        assert!(sim.live_ids(EntityKind::Vehicle).is_err());
        assert!(sim.lane_shapes().is_err());
        assert!(sim.fetch_attributes(EntityKind::TrafficLight, "J1").is_err());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut sim = DemoSimulator::from_network(green());
        sim.stop();
        assert!(!sim.is_active());
        sim.stop();
        assert!(!sim.is_active());
    }

    #[test]
    fn test_route_heading_follows_segments() {
        let net = NetworkDefinition::from_json(
            r#"{
                "lanes": [ { "id": "a", "shape": [[0, 0], [0, 10]] },
                           { "id": "b", "shape": [[0, 10], [10, 10]] } ],
                "routes": [ { "id": "r", "lanes": ["a", "b"] } ]
            }"#,
        )
        .unwrap();
        let sim = DemoSimulator::from_network(net);
        let route = &sim.routes[0];
        assert_eq!(route.points.len(), 3);
        assert!(approx_eq(route.length(), 20.0));
        let (p, heading) = route.locate(5.0);
        assert!(approx_eq(p.y, 5.0));
        assert!(approx_eq(heading, 0.0));
        let (p, heading) = route.locate(15.0);
        assert!(approx_eq(p.x, 5.0));
        assert!(approx_eq(heading, 90.0));
    }
}
