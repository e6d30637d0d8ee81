//! Per-frame orchestration.
//!
//! [`TickDriver`] owns the simulator handle, the ECS world holding every
//! visual, and the per-kind adapters. Startup fits the lane geometry onto the
//! canvas once; after that each [`TickDriver::tick`] does:
//!
//! 1. read [`RunState`]; a paused driver does nothing else
//! 2. advance the simulator by one step
//! 3. advance [`SimClock`]
//! 4. reconcile vehicles, then traffic lights
//! 5. refresh [`SimStats`]
//!
//! A failed live-id listing skips that kind's pass for the tick and leaves its
//! tracked entities untouched. A failed step is returned to the caller.

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use log::{error, info, warn};

use crate::error::{SimulatorError, SpawnSubmissionError, StartupError};
use crate::events::simcontrol::{
    PauseEvent, ResumeEvent, TogglePauseEvent, pause_observer, resume_observer,
    toggle_pause_observer,
};
use crate::events::switchdebug::{SwitchDebugEvent, switch_debug_observer};
use crate::reconcile::ReconcileReport;
use crate::resources::canvassize::CanvasSize;
use crate::resources::runstate::RunState;
use crate::resources::simclock::SimClock;
use crate::resources::simstats::SimStats;
use crate::resources::viewerconfig::ViewerConfig;
use crate::simulator::{EntityKind, Simulator};
use crate::sink::EcsSink;
use crate::sync::lanes::LaneLayer;
use crate::sync::trafficlights::TrafficLightSync;
use crate::sync::vehicles::{VehicleKind, VehicleSync};
use crate::systems::stats::update_sim_stats;
use crate::systems::time::advance_sim_clock;
use crate::transform::WorldBounds;

/// What one call to [`TickDriver::tick`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// `false` when the driver was paused and nothing happened.
    pub stepped: bool,
    /// `None` when the vehicle pass was skipped.
    pub vehicles: Option<ReconcileReport>,
    /// `None` when the traffic-light pass was skipped.
    pub traffic_lights: Option<ReconcileReport>,
}

impl TickReport {
    /// Fetch failures across both passes.
    pub fn failure_count(&self) -> usize {
        [&self.vehicles, &self.traffic_lights]
            .into_iter()
            .flatten()
            .map(|r| r.failures.len())
            .sum()
    }
}

pub struct TickDriver<S: Simulator> {
    sim: S,
    world: World,
    bounds: WorldBounds,
    config: ViewerConfig,
    vehicles: VehicleSync<Entity>,
    traffic_lights: TrafficLightSync<Entity>,
    lanes: LaneLayer<Entity>,
}

impl<S: Simulator> TickDriver<S> {
    /// Start the simulator, fit the network onto the canvas and draw the
    /// lanes.
    ///
    /// Fails before any tick when the network file is missing, the simulator
    /// refuses to start, or there is no lane geometry to fit. The simulator
    /// is stopped again on failure.
    pub fn startup(mut sim: S, config: &ViewerConfig) -> Result<Self, StartupError> {
        let (lanes, bounds) = match Self::prepare(&mut sim, config) {
            Ok(prepared) => prepared,
            Err(e) => {
                error!("Startup failed: {}", e);
                sim.stop();
                return Err(e);
            }
        };
        info!(
            "World bounds x:[{:.1}, {:.1}] y:[{:.1}, {:.1}] scale={:.3}",
            bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y, bounds.scale
        );

        let (w, h) = config.canvas_size();
        let mut world = World::new();
        world.insert_resource(config.clone());
        world.insert_resource(CanvasSize { w, h });
        world.insert_resource(RunState::new(!config.start_paused));
        world.insert_resource(SimClock::default());
        world.insert_resource(SimStats::default());

        world.spawn(Observer::new(pause_observer));
        world.spawn(Observer::new(resume_observer));
        world.spawn(Observer::new(toggle_pause_observer));
        world.spawn(Observer::new(switch_debug_observer));
        // Ensure the observers are registered before anything triggers events.
        world.flush();

        let mut driver = Self {
            sim,
            world,
            bounds,
            config: config.clone(),
            vehicles: VehicleSync::new(),
            traffic_lights: TrafficLightSync::new(config.signal_index),
            lanes,
        };
        let drawn = driver
            .lanes
            .build(&mut EcsSink::new(&mut driver.world), &driver.bounds);
        driver.world.resource_mut::<SimStats>().lanes = drawn;
        info!("Viewer ready: {} lanes drawn", drawn);
        Ok(driver)
    }

    fn prepare(
        sim: &mut S,
        config: &ViewerConfig,
    ) -> Result<(LaneLayer<Entity>, WorldBounds), StartupError> {
        if !config.network_path.is_file() {
            return Err(StartupError::MissingConfiguration(config.network_path.clone()));
        }
        sim.start(&config.network_path)?;
        let lanes = LaneLayer::load(sim)?;
        let (w, h) = config.canvas_size();
        let bounds = WorldBounds::compute(lanes.points(), w, h, config.margin)?;
        Ok((lanes, bounds))
    }

    /// Run one frame of the viewer.
    pub fn tick(&mut self) -> Result<TickReport, SimulatorError> {
        if !self.is_running() {
            return Ok(TickReport::default());
        }

        self.sim.step()?;
        advance_sim_clock(&mut self.world, self.sim.step_length());

        let mut sink = EcsSink::new(&mut self.world);
        let vehicles = match self.vehicles.sync(&mut self.sim, &mut sink, &self.bounds) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Skipping {} pass: {}", EntityKind::Vehicle, e);
                None
            }
        };
        let traffic_lights = match self
            .traffic_lights
            .sync(&mut self.sim, &mut sink, &self.bounds)
        {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Skipping {} pass: {}", EntityKind::TrafficLight, e);
                None
            }
        };

        update_sim_stats(
            &mut self.world,
            self.vehicles.len(),
            self.traffic_lights.len(),
            &[vehicles.as_ref(), traffic_lights.as_ref()],
        );

        Ok(TickReport {
            stepped: true,
            vehicles,
            traffic_lights,
        })
    }

    pub fn is_running(&self) -> bool {
        self.world.resource::<RunState>().is_running()
    }

    pub fn pause(&mut self) {
        self.world.trigger(PauseEvent {});
    }

    pub fn resume(&mut self) {
        self.world.trigger(ResumeEvent {});
    }

    pub fn toggle_pause(&mut self) {
        self.world.trigger(TogglePauseEvent {});
    }

    pub fn toggle_debug(&mut self) {
        self.world.trigger(SwitchDebugEvent {});
        self.world.flush();
    }

    /// Submit a spawn; the vehicle is drawn once a later tick lists it.
    pub fn request_spawn(
        &mut self,
        kind: VehicleKind,
        route_id: &str,
    ) -> Result<String, SpawnSubmissionError> {
        let result = self.vehicles.request_spawn(&mut self.sim, kind, route_id);
        if result.is_err() {
            self.world.resource_mut::<SimStats>().spawn_failures += 1;
        }
        result
    }

    /// Spawn a vehicle of a random configured type on a random configured
    /// route. Returns `Ok(None)` when either list is empty.
    pub fn spawn_random_vehicle(&mut self) -> Result<Option<String>, SpawnSubmissionError> {
        let types = &self.config.spawn_types;
        let routes = &self.config.spawn_routes;
        if types.is_empty() || routes.is_empty() {
            warn!("No spawn types or routes configured, not spawning");
            return Ok(None);
        }
        let kind = types[fastrand::usize(..types.len())];
        let route = routes[fastrand::usize(..routes.len())].clone();
        self.request_spawn(kind, &route).map(Some)
    }

    /// Re-read lane shapes from the simulator and redraw them with the
    /// existing bounds.
    pub fn reload_lanes(&mut self) -> Result<usize, SimulatorError> {
        self.lanes.reload(&mut self.sim)?;
        let drawn = self
            .lanes
            .rebuild(&mut EcsSink::new(&mut self.world), &self.bounds);
        self.world.resource_mut::<SimStats>().lanes = drawn;
        Ok(drawn)
    }

    /// Remove every visual and stop the simulator if it is still active.
    pub fn shutdown(&mut self) {
        let mut sink = EcsSink::new(&mut self.world);
        let vehicles = self.vehicles.clear(&mut sink);
        let lights = self.traffic_lights.clear(&mut sink);
        let lanes = self.lanes.clear(&mut sink);
        info!(
            "Removed {} vehicles, {} traffic lights, {} lanes",
            vehicles, lights, lanes
        );

        if self.sim.is_active() {
            self.sim.stop();
        }

        let stats = *self.world.resource::<SimStats>();
        info!(
            "Shut down after {} steps ({} fetch failures, {} spawn failures)",
            self.clock().steps,
            stats.total_fetch_failures,
            stats.spawn_failures
        );
        let mut stats = self.world.resource_mut::<SimStats>();
        stats.vehicles = 0;
        stats.traffic_lights = 0;
        stats.lanes = 0;
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn simulator(&self) -> &S {
        &self.sim
    }

    pub fn simulator_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn vehicles(&self) -> &VehicleSync<Entity> {
        &self.vehicles
    }

    pub fn traffic_lights(&self) -> &TrafficLightSync<Entity> {
        &self.traffic_lights
    }

    pub fn lanes(&self) -> &LaneLayer<Entity> {
        &self.lanes
    }

    pub fn clock(&self) -> SimClock {
        *self.world.resource::<SimClock>()
    }

    pub fn stats(&self) -> SimStats {
        *self.world.resource::<SimStats>()
    }
}
