//! ECS components for visual entities.
//!
//! Every vehicle, traffic light and lane shown on the canvas is an entity in
//! the viewer's `bevy_ecs` world. These components hold what the renderer
//! needs to draw them; the simulator ids they mirror live in the
//! reconciliation sets of [`crate::sync`].
//!
//! Submodules overview:
//! - [`lanestroke`] – static lane polyline in screen coordinates
//! - [`rotation`] – heading in degrees
//! - [`screenposition`] – canvas position of a visual
//! - [`signallamp`] – traffic-light circle and its current color
//! - [`vehiclesprite`] – vehicle box sized by vehicle kind
//! - [`zindex`] – rendering order hint

pub mod lanestroke;
pub mod rotation;
pub mod screenposition;
pub mod signallamp;
pub mod vehiclesprite;
pub mod zindex;
