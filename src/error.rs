//! Error taxonomy for the viewer.
//!
//! Startup errors ([`StartupError`], [`TransformError::EmptyGeometry`]) are
//! fatal and surface before the first tick. Per-entity errors
//! ([`FetchError`], [`SpawnSubmissionError`]) are recoverable: they are logged
//! and isolated to the entity they concern.

use std::path::PathBuf;
use thiserror::Error;

use crate::simulator::EntityKind;

/// Errors raised by the world→screen transform.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformError {
    /// No static geometry to derive bounds from.
    #[error("cannot compute bounds from empty geometry")]
    EmptyGeometry,
    /// Transform used before bounds were computed.
    #[error("world bounds have not been computed yet")]
    BoundsNotReady,
}

/// An entity vanished (or could not be queried) between listing and query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} '{id}' could not be queried: {reason}")]
pub struct FetchError {
    pub kind: EntityKind,
    pub id: String,
    pub reason: String,
}

impl FetchError {
    pub fn new(kind: EntityKind, id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Errors reported by a [`Simulator`](crate::simulator::Simulator).
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("simulator is not active")]
    Inactive,
    #[error("failed to read network file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid network description: {0}")]
    Network(#[from] serde_json::Error),
    #[error("unknown route '{0}'")]
    UnknownRoute(String),
    #[error("unknown vehicle type '{0}'")]
    UnknownVehicleType(String),
    #[error("entity id '{0}' is already in use")]
    DuplicateId(String),
    #[error("{0} entities cannot be spawned")]
    NotSpawnable(EntityKind),
    #[error("{0}")]
    Other(String),
}

/// A spawn command could not be submitted. The vehicle is simply absent.
#[derive(Error, Debug)]
#[error("failed to submit spawn of '{id}' on route '{route_id}': {source}")]
pub struct SpawnSubmissionError {
    pub id: String,
    pub route_id: String,
    #[source]
    pub source: SimulatorError,
}

/// Fatal errors raised before the tick loop starts.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("network file not found: {0}")]
    MissingConfiguration(PathBuf),
    #[error("simulator failed to start: {0}")]
    Simulator(#[from] SimulatorError),
    #[error("cannot map the network onto the canvas: {0}")]
    Transform(#[from] TransformError),
}
