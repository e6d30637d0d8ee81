//! Per-kind bindings between the simulator and the rendering sink.
//!
//! - [`vehicles`] – reconciles moving vehicles every tick, submits spawns
//! - [`trafficlights`] – reconciles traffic lights, maps signal state to color
//! - [`lanes`] – one-shot builder for the static lane geometry
//!
//! Each adapter owns its tracked state and borrows the simulator, the sink
//! and the [`WorldBounds`](crate::transform::WorldBounds) only for the
//! duration of a call.

pub mod lanes;
pub mod trafficlights;
pub mod vehicles;
