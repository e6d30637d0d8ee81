//! Rendering sink: where reconciled visuals end up.
//!
//! Adapters describe each visual as a [`Visual`] in screen coordinates and
//! hand it to a [`RenderingSink`]. The sink owns the actual drawable resource
//! and returns an opaque handle for it. Handles are released exactly once:
//! [`RenderingSink::destroy_visual`] takes the handle by value.
//!
//! [`EcsSink`] is the sink used by the viewer. It materializes every visual
//! as an entity in a `bevy_ecs` [`World`] and returns its [`Entity`] as the
//! handle; the render system draws whatever entities exist.

use bevy_ecs::prelude::*;
use log::debug;

use crate::components::lanestroke::LaneStroke;
use crate::components::rotation::Rotation;
use crate::components::screenposition::ScreenPosition;
use crate::components::signallamp::SignalLamp;
use crate::components::vehiclesprite::VehicleSprite;
use crate::components::zindex::ZIndex;
use crate::sync::trafficlights::SignalColor;
use crate::sync::vehicles::VehicleKind;
use crate::transform::ScreenPoint;

/// A vehicle box, centered on its screen position.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleVisual {
    pub id: String,
    pub kind: VehicleKind,
    pub center: ScreenPoint,
    /// `center − (width/2, height/2)`.
    pub top_left: ScreenPoint,
    pub width: f64,
    pub height: f64,
    pub rotation_degrees: f64,
}

impl VehicleVisual {
    /// Place a vehicle of `kind` so that its box is centered on `center`.
    pub fn centered(id: &str, kind: VehicleKind, center: ScreenPoint, rotation_degrees: f64) -> Self {
        let (width, height) = kind.size();
        Self {
            id: id.to_string(),
            kind,
            center,
            top_left: ScreenPoint::new(center.x - width / 2.0, center.y - height / 2.0),
            width,
            height,
            rotation_degrees,
        }
    }
}

/// A traffic-light circle.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalVisual {
    pub id: String,
    pub center: ScreenPoint,
    pub radius: f64,
    pub color: SignalColor,
}

/// A static lane polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneVisual {
    pub points: Vec<ScreenPoint>,
    pub stroke_width: f64,
}

/// Everything a sink can be asked to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Visual {
    Vehicle(VehicleVisual),
    Signal(SignalVisual),
    Lane(LaneVisual),
}

/// Owner of drawable resources.
pub trait RenderingSink {
    type Handle;

    fn create_visual(&mut self, visual: &Visual) -> Self::Handle;

    fn update_visual(&mut self, handle: &Self::Handle, visual: &Visual);

    fn destroy_visual(&mut self, handle: Self::Handle);
}

/// Sink that stores visuals as ECS entities.
pub struct EcsSink<'w> {
    world: &'w mut World,
}

impl<'w> EcsSink<'w> {
    pub fn new(world: &'w mut World) -> Self {
        Self { world }
    }
}

impl RenderingSink for EcsSink<'_> {
    type Handle = Entity;

    fn create_visual(&mut self, visual: &Visual) -> Entity {
        match visual {
            Visual::Vehicle(v) => self
                .world
                .spawn((
                    VehicleSprite {
                        id: v.id.clone(),
                        kind: v.kind,
                        width: v.width,
                        height: v.height,
                    },
                    ScreenPosition::from_point(v.top_left),
                    Rotation {
                        degrees: v.rotation_degrees,
                    },
                    ZIndex::VEHICLES,
                ))
                .id(),
            Visual::Signal(s) => self
                .world
                .spawn((
                    SignalLamp {
                        id: s.id.clone(),
                        color: s.color,
                        radius: s.radius,
                    },
                    ScreenPosition::from_point(s.center),
                    ZIndex::SIGNALS,
                ))
                .id(),
            Visual::Lane(l) => self
                .world
                .spawn((
                    LaneStroke {
                        points: l.points.clone(),
                        width: l.stroke_width,
                    },
                    ZIndex::LANES,
                ))
                .id(),
        }
    }

    fn update_visual(&mut self, handle: &Entity, visual: &Visual) {
        match visual {
            Visual::Vehicle(v) => {
                if let Some(mut pos) = self.world.get_mut::<ScreenPosition>(*handle) {
                    pos.set_pos(v.top_left);
                }
                if let Some(mut rot) = self.world.get_mut::<Rotation>(*handle) {
                    rot.degrees = v.rotation_degrees;
                }
            }
            // Traffic lights never move; only the color follows the state.
            Visual::Signal(s) => {
                if let Some(mut lamp) = self.world.get_mut::<SignalLamp>(*handle) {
                    lamp.color = s.color;
                }
            }
            Visual::Lane(l) => {
                if let Some(mut stroke) = self.world.get_mut::<LaneStroke>(*handle) {
                    stroke.points = l.points.clone();
                    stroke.width = l.stroke_width;
                }
            }
        }
    }

    fn destroy_visual(&mut self, handle: Entity) {
        if !self.world.despawn(handle) {
            debug!("Visual entity {:?} was already gone", handle);
        }
    }
}
