//! Boundary to the external traffic simulator.
//!
//! The viewer never looks inside the simulator: it steps it, lists the ids of
//! live entities, queries their attributes, and submits spawn commands. Every
//! call is synchronous and blocks the tick.
//!
//! Submodules:
//! - [`demo`] – a small self-contained simulator used by the binary and tests
//! - [`network`] – JSON network description loaded by the demo simulator

pub mod demo;
pub mod network;

use std::fmt;
use std::path::Path;

use crate::error::{FetchError, SimulatorError};
use crate::transform::WorldPoint;

/// Kinds of dynamic entities reported by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Vehicle,
    TrafficLight,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Vehicle => write!(f, "vehicle"),
            EntityKind::TrafficLight => write!(f, "traffic light"),
        }
    }
}

/// Raw attributes of one entity as reported by the simulator.
///
/// `type_or_state` carries the vehicle type id for vehicles and the
/// red/yellow/green state string for traffic lights. Traffic lights report a
/// rotation of `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityAttributes {
    pub position: WorldPoint,
    pub rotation_degrees: f64,
    pub type_or_state: String,
}

/// Query/command API of an external traffic simulator.
pub trait Simulator {
    /// Connect to (or launch) the simulation described by `config_path`.
    /// Calling it while already active is a no-op.
    fn start(&mut self, config_path: &Path) -> Result<(), SimulatorError>;

    /// Disconnect. Calling it while inactive is a no-op.
    fn stop(&mut self);

    fn is_active(&self) -> bool;

    /// Advance simulated time by one discrete step.
    fn step(&mut self) -> Result<(), SimulatorError>;

    /// Simulated seconds covered by one [`Simulator::step`].
    fn step_length(&self) -> f64 {
        1.0
    }

    /// Ids of entities of `kind` currently alive in the simulation.
    fn live_ids(&mut self, kind: EntityKind) -> Result<Vec<String>, SimulatorError>;

    /// Attributes of a single entity. Fails when the id vanished between
    /// listing and query.
    fn fetch_attributes(&mut self, kind: EntityKind, id: &str)
    -> Result<EntityAttributes, FetchError>;

    /// Current red/yellow/green state string of a traffic light.
    fn signal_state(&mut self, id: &str) -> Result<String, FetchError> {
        self.fetch_attributes(EntityKind::TrafficLight, id)
            .map(|attrs| attrs.type_or_state)
    }

    /// Static lane geometry, one polyline per lane, in world coordinates.
    fn lane_shapes(&mut self) -> Result<Vec<Vec<WorldPoint>>, SimulatorError>;

    /// Fire-and-forget creation command. The entity shows up in
    /// [`Simulator::live_ids`] once the simulator has inserted it.
    fn spawn(
        &mut self,
        kind: EntityKind,
        id: &str,
        type_tag: &str,
        route_id: &str,
    ) -> Result<(), SimulatorError>;
}
