//! Traffic-light synchronization.
//!
//! Traffic lights are stationary. Their junction position is queried and
//! converted to screen space once, when the light is first seen; every later
//! tick only re-queries the red/yellow/green state string and recolors the
//! lamp.
//!
//! # State → Color
//!
//! A state string holds one character per controlled link (`"GrGr"`,
//! `"yyrr"`, ...). The lamp shows a single color, taken from the character at
//! the index chosen by [`SignalIndexPolicy`]:
//!
//! | character (lower-cased) | color                       |
//! |-------------------------|-----------------------------|
//! | `g`                     | [`SignalColor::Green`]      |
//! | `y`                     | [`SignalColor::Yellow`]     |
//! | `r`                     | [`SignalColor::Red`]        |
//! | anything else / empty   | [`SignalColor::Unknown`]    |

use std::str::FromStr;

use crate::error::{FetchError, SimulatorError};
use crate::reconcile::{ReconcileOps, ReconcileReport, ReconciliationSet, reconcile};
use crate::simulator::{EntityKind, Simulator};
use crate::sink::{RenderingSink, SignalVisual, Visual};
use crate::transform::{ScreenPoint, WorldBounds, WorldPoint};

/// Default lamp radius in pixels.
pub const DEFAULT_LAMP_RADIUS: f64 = 8.0;

/// Display color of a traffic light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignalColor {
    Red,
    Yellow,
    Green,
    #[default]
    Unknown,
}

impl SignalColor {
    /// Map a state string to a color, inspecting the character chosen by
    /// `policy`.
    pub fn from_state(state: &str, policy: SignalIndexPolicy) -> Self {
        let len = state.chars().count();
        if len == 0 {
            return SignalColor::Unknown;
        }
        match state.chars().nth(policy.index(len)) {
            Some(c) => match c.to_ascii_lowercase() {
                'g' => SignalColor::Green,
                'y' => SignalColor::Yellow,
                'r' => SignalColor::Red,
                _ => SignalColor::Unknown,
            },
            None => SignalColor::Unknown,
        }
    }

    /// RGB fill used by the renderer.
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            SignalColor::Red => (139, 0, 0),
            SignalColor::Yellow => (255, 255, 0),
            SignalColor::Green => (0, 128, 0),
            SignalColor::Unknown => (128, 128, 128),
        }
    }
}

/// Which character of the state string decides the lamp color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalIndexPolicy {
    /// Always the first character.
    First,
    /// The second character, or the first one for single-link states.
    #[default]
    Second,
}

impl SignalIndexPolicy {
    /// Index to inspect in a non-empty state of `len` characters.
    pub fn index(&self, len: usize) -> usize {
        match self {
            SignalIndexPolicy::First => 0,
            SignalIndexPolicy::Second => 1.min(len.saturating_sub(1)),
        }
    }
}

impl FromStr for SignalIndexPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "0" => Ok(SignalIndexPolicy::First),
            "second" | "1" => Ok(SignalIndexPolicy::Second),
            other => Err(format!("unknown signal index policy '{}'", other)),
        }
    }
}

/// Attributes tracked for one traffic light.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficLightAttributes {
    pub position: WorldPoint,
    /// Screen center, converted once when the light was first fetched.
    pub center: ScreenPoint,
    pub state: String,
    pub color: SignalColor,
}

struct TrafficLightOps<'a, Sim: ?Sized, S> {
    sim: &'a mut Sim,
    sink: &'a mut S,
    bounds: &'a WorldBounds,
    policy: SignalIndexPolicy,
}

impl<Sim, S> TrafficLightOps<'_, Sim, S>
where
    Sim: Simulator + ?Sized,
    S: RenderingSink,
{
    fn visual(&self, id: &str, attrs: &TrafficLightAttributes) -> Visual {
        Visual::Signal(SignalVisual {
            id: id.to_string(),
            center: attrs.center,
            radius: DEFAULT_LAMP_RADIUS,
            color: attrs.color,
        })
    }
}

impl<Sim, S> ReconcileOps for TrafficLightOps<'_, Sim, S>
where
    Sim: Simulator + ?Sized,
    S: RenderingSink,
{
    type Handle = S::Handle;
    type Attrs = TrafficLightAttributes;

    fn fetch_attributes(
        &mut self,
        id: &str,
        previous: Option<&TrafficLightAttributes>,
    ) -> Result<TrafficLightAttributes, FetchError> {
        let (position, center, state) = match previous {
            Some(prev) => (prev.position, prev.center, self.sim.signal_state(id)?),
            None => {
                let raw = self.sim.fetch_attributes(EntityKind::TrafficLight, id)?;
                let center = self.bounds.world_to_screen(raw.position);
                (raw.position, center, raw.type_or_state)
            }
        };
        let color = SignalColor::from_state(&state, self.policy);
        Ok(TrafficLightAttributes {
            position,
            center,
            state,
            color,
        })
    }

    fn create_visual(&mut self, id: &str, attrs: &TrafficLightAttributes) -> S::Handle {
        let visual = self.visual(id, attrs);
        self.sink.create_visual(&visual)
    }

    fn update_visual(&mut self, id: &str, handle: &S::Handle, attrs: &TrafficLightAttributes) {
        let visual = self.visual(id, attrs);
        self.sink.update_visual(handle, &visual);
    }

    fn destroy_visual(&mut self, handle: S::Handle) {
        self.sink.destroy_visual(handle);
    }
}

/// Tracked traffic lights and their lamps.
#[derive(Debug)]
pub struct TrafficLightSync<H> {
    tracked: ReconciliationSet<H, TrafficLightAttributes>,
    policy: SignalIndexPolicy,
}

impl<H> TrafficLightSync<H> {
    pub fn new(policy: SignalIndexPolicy) -> Self {
        Self {
            tracked: ReconciliationSet::new(EntityKind::TrafficLight),
            policy,
        }
    }

    pub fn tracked(&self) -> &ReconciliationSet<H, TrafficLightAttributes> {
        &self.tracked
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Current color of a tracked light.
    pub fn color_of(&self, id: &str) -> Option<SignalColor> {
        self.tracked.get(id).map(|e| e.last_attributes().color)
    }

    /// One reconciliation pass against the simulator's traffic lights.
    pub fn sync<Sim, S>(
        &mut self,
        sim: &mut Sim,
        sink: &mut S,
        bounds: &WorldBounds,
    ) -> Result<ReconcileReport, SimulatorError>
    where
        Sim: Simulator + ?Sized,
        S: RenderingSink<Handle = H>,
    {
        let live = sim.live_ids(EntityKind::TrafficLight)?;
        let mut ops = TrafficLightOps {
            sim,
            sink,
            bounds,
            policy: self.policy,
        };
        Ok(reconcile(&mut self.tracked, live, &mut ops))
    }

    /// Destroy every lamp.
    pub fn clear<S: RenderingSink<Handle = H>>(&mut self, sink: &mut S) -> usize {
        self.tracked.clear(|handle| sink.destroy_visual(handle))
    }
}
