//! Viewer systems.
//!
//! Submodules overview
//! - [`render`] – draw visual entities and the debug overlay using Raylib
//! - [`stats`] – refresh [`crate::resources::simstats::SimStats`] after a tick
//! - [`time`] – advance the simulation clock

#[cfg(feature = "gui")]
pub mod render;
pub mod stats;
pub mod time;
