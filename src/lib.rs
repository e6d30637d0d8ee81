//! Traffic Flow viewer library.
//!
//! Keeps a 2D canvas in sync with a running traffic simulation. The
//! simulator is reached through the [`simulator::Simulator`] trait; every
//! vehicle, traffic light and lane it reports becomes an entity in a
//! `bevy_ecs` world that the renderer draws.
//!
//! - [`transform`] – fit world geometry onto the canvas
//! - [`reconcile`] – generic live-set vs tracked-set diff engine
//! - [`sync`] – per-kind adapters built on the reconciler
//! - [`driver`] – startup and the per-frame tick
//! - [`sink`] – rendering sink trait and its ECS implementation

pub mod components;
pub mod driver;
pub mod error;
pub mod events;
pub mod reconcile;
pub mod resources;
pub mod simulator;
pub mod sink;
pub mod sync;
pub mod systems;
pub mod transform;
