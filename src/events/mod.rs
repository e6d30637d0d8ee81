//! Event types and observers used by the viewer.
//!
//! Submodules:
//! - [`simcontrol`] – pause, resume and toggle the tick loop
//! - [`switchdebug`] – toggle the debug overlay on/off
pub mod simcontrol;
pub mod switchdebug;
