//! Run/pause flag of the tick loop.
//!
//! The driver reads this resource once at the top of every tick; a paused
//! viewer neither steps the simulator nor touches any visual. Toggle it with
//! the events in [`crate::events::simcontrol`].

use bevy_ecs::prelude::Resource;

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    running: bool,
}

impl Default for RunState {
    fn default() -> Self {
        RunState { running: true }
    }
}

impl RunState {
    pub fn new(running: bool) -> Self {
        RunState { running }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self) {
        self.running = true;
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }
}
