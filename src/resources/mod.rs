//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the viewer's ECS
//! world. Each submodule documents the semantics and intended usage of its
//! resource.
//!
//! Overview
//! - `canvassize` – canvas dimensions the network was fitted to
//! - `debugmode` – presence toggles the debug overlay
//! - `runstate` – run/pause flag read at the top of every tick
//! - `simclock` – executed steps and simulated time
//! - `simstats` – tracked entity counts and failure counters
//! - `viewerconfig` – settings loaded from the INI file
pub mod canvassize;
pub mod debugmode;
pub mod runstate;
pub mod simclock;
pub mod simstats;
pub mod viewerconfig;
