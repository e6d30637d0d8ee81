//! Events and observers that pause and resume the tick loop.
//!
//! Each event flips the [`RunState`] resource. Triggering them from a key
//! handler or from tests has the same effect as calling the driver's
//! `pause`/`resume` methods.
use crate::resources::runstate::RunState;
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::info;

#[derive(Event, Debug, Clone, Copy)]
pub struct PauseEvent {}

#[derive(Event, Debug, Clone, Copy)]
pub struct ResumeEvent {}

/// Pause when running, resume when paused.
#[derive(Event, Debug, Clone, Copy)]
pub struct TogglePauseEvent {}

pub fn pause_observer(_trigger: On<PauseEvent>, mut run_state: ResMut<RunState>) {
    if run_state.is_running() {
        run_state.pause();
        info!("Simulation paused");
    }
}

pub fn resume_observer(_trigger: On<ResumeEvent>, mut run_state: ResMut<RunState>) {
    if !run_state.is_running() {
        run_state.resume();
        info!("Simulation resumed");
    }
}

pub fn toggle_pause_observer(_trigger: On<TogglePauseEvent>, mut run_state: ResMut<RunState>) {
    run_state.toggle();
    info!(
        "Simulation {}",
        if run_state.is_running() { "resumed" } else { "paused" }
    );
}
