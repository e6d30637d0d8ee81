//! JSON network description for the demo simulator.
//!
//! # File Format
//!
//! ```json
//! {
//!   "step_length": 0.1,
//!   "lanes": [ { "id": "w_in", "shape": [[0, 100], [95, 100]] } ],
//!   "routes": [
//!     { "id": "r1", "lanes": ["w_in", "e_out"],
//!       "signal": { "tls": "J1", "link": 0, "stop_at": 93.0 } }
//!   ],
//!   "traffic_lights": [
//!     { "id": "J1", "position": [100, 100],
//!       "phases": [ { "state": "GGrr", "duration": 20.0 } ] }
//!   ],
//!   "vehicle_types": [ { "id": "car", "max_speed": 13.9, "length": 5.0 } ],
//!   "flows": [ { "id": "f1", "type": "car", "route": "r1", "period": 40 } ]
//! }
//! ```
//!
//! Coordinates are meters with the Y axis pointing up. Phase durations are
//! simulated seconds, flow periods are simulation steps.

use std::path::Path;

use serde::Deserialize;

use crate::error::SimulatorError;
use crate::transform::WorldPoint;

fn default_step_length() -> f64 {
    0.1
}

fn default_min_gap() -> f64 {
    2.5
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkDefinition {
    /// Simulated seconds per step.
    #[serde(default = "default_step_length")]
    pub step_length: f64,
    /// Minimum bumper-to-bumper distance kept between vehicles.
    #[serde(default = "default_min_gap")]
    pub min_gap: f64,
    pub lanes: Vec<LaneDef>,
    #[serde(default)]
    pub routes: Vec<RouteDef>,
    #[serde(default)]
    pub traffic_lights: Vec<TrafficLightDef>,
    #[serde(default)]
    pub vehicle_types: Vec<VehicleTypeDef>,
    #[serde(default)]
    pub flows: Vec<FlowDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LaneDef {
    pub id: String,
    pub shape: Vec<[f64; 2]>,
}

impl LaneDef {
    pub fn points(&self) -> Vec<WorldPoint> {
        self.shape
            .iter()
            .map(|[x, y]| WorldPoint::new(*x, *y))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteDef {
    pub id: String,
    /// Lane ids driven in order. Their shapes are chained into one path.
    pub lanes: Vec<String>,
    #[serde(default)]
    pub signal: Option<SignalStopDef>,
}

/// Stop line controlled by one link of a traffic light.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalStopDef {
    pub tls: String,
    /// Index into the traffic light's state string.
    pub link: usize,
    /// Distance along the route where vehicles stop.
    pub stop_at: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrafficLightDef {
    pub id: String,
    pub position: [f64; 2],
    pub phases: Vec<PhaseDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhaseDef {
    pub state: String,
    pub duration: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleTypeDef {
    pub id: String,
    pub max_speed: f64,
    pub length: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlowDef {
    pub id: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub route: String,
    /// Steps between departures.
    pub period: u64,
}

impl NetworkDefinition {
    pub fn from_json(text: &str) -> Result<Self, SimulatorError> {
        let network: NetworkDefinition = serde_json::from_str(text)?;
        network.validate()?;
        Ok(network)
    }

    pub fn load(path: &Path) -> Result<Self, SimulatorError> {
        let text = std::fs::read_to_string(path).map_err(|source| SimulatorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Check cross references between lanes, routes, lights and flows.
    fn validate(&self) -> Result<(), SimulatorError> {
        if self.step_length <= 0.0 {
            return Err(SimulatorError::Other(format!(
                "step_length must be positive, got {}",
                self.step_length
            )));
        }
        for route in &self.routes {
            if route.lanes.is_empty() {
                return Err(SimulatorError::Other(format!(
                    "route '{}' has no lanes",
                    route.id
                )));
            }
            for lane in &route.lanes {
                if !self.lanes.iter().any(|l| &l.id == lane) {
                    return Err(SimulatorError::Other(format!(
                        "route '{}' references unknown lane '{}'",
                        route.id, lane
                    )));
                }
            }
            if let Some(signal) = &route.signal {
                let Some(tls) = self.traffic_lights.iter().find(|t| t.id == signal.tls) else {
                    return Err(SimulatorError::Other(format!(
                        "route '{}' references unknown traffic light '{}'",
                        route.id, signal.tls
                    )));
                };
                // Every phase must have a state for the link, or the stop never clears.
                if let Some(phase) = tls
                    .phases
                    .iter()
                    .find(|p| signal.link >= p.state.chars().count())
                {
                    return Err(SimulatorError::Other(format!(
                        "route '{}' uses link {} of traffic light '{}', but phase '{}' has only {} links",
                        route.id,
                        signal.link,
                        tls.id,
                        phase.state,
                        phase.state.chars().count()
                    )));
                }
            }
        }
        for tls in &self.traffic_lights {
            if tls.phases.is_empty() {
                return Err(SimulatorError::Other(format!(
                    "traffic light '{}' has no phases",
                    tls.id
                )));
            }
        }
        for flow in &self.flows {
            if !self.routes.iter().any(|r| r.id == flow.route) {
                return Err(SimulatorError::UnknownRoute(flow.route.clone()));
            }
            if !self.vehicle_types.iter().any(|t| t.id == flow.vehicle_type) {
                return Err(SimulatorError::UnknownVehicleType(flow.vehicle_type.clone()));
            }
            if flow.period == 0 {
                return Err(SimulatorError::Other(format!(
                    "flow '{}' has a zero period",
                    flow.id
                )));
            }
        }
        Ok(())
    }
}
