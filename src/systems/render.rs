use bevy_ecs::prelude::*;
use raylib::prelude::*;

use crate::components::lanestroke::LaneStroke;
use crate::components::rotation::Rotation;
use crate::components::screenposition::ScreenPosition;
use crate::components::signallamp::SignalLamp;
use crate::components::vehiclesprite::VehicleSprite;
use crate::components::zindex::ZIndex;
use crate::resources::canvassize::CanvasSize;
use crate::resources::debugmode::DebugMode;
use crate::resources::runstate::RunState;
use crate::resources::simclock::SimClock;
use crate::resources::simstats::SimStats;
use crate::sync::vehicles::VehicleKind;

pub const BACKGROUND: Color = Color::new(0xf4, 0xf4, 0xf4, 0xff);
const LANE_COLOR: Color = Color::LIGHTGRAY;

enum Drawable {
    Lane(LaneStroke),
    Lamp(SignalLamp, ScreenPosition),
    Vehicle(VehicleSprite, ScreenPosition, Rotation),
}

fn vehicle_color(kind: VehicleKind) -> Color {
    match kind {
        VehicleKind::Car => Color::new(30, 90, 200, 255),
        VehicleKind::Bus => Color::new(230, 140, 20, 255),
        VehicleKind::Truck => Color::new(90, 90, 90, 255),
    }
}

/// Draw every visual entity, lowest [`ZIndex`] first.
///
/// Call inside raylib's drawing scope after clearing to [`BACKGROUND`].
pub fn render_pass(world: &mut World, d: &mut RaylibDrawHandle) {
    let mut to_draw: Vec<(ZIndex, Drawable)> = Vec::new();
    {
        let mut q = world.query::<(&LaneStroke, &ZIndex)>();
        to_draw.extend(q.iter(world).map(|(l, z)| (*z, Drawable::Lane(l.clone()))));
    }
    {
        let mut q = world.query::<(&SignalLamp, &ScreenPosition, &ZIndex)>();
        to_draw.extend(
            q.iter(world)
                .map(|(s, p, z)| (*z, Drawable::Lamp(s.clone(), *p))),
        );
    }
    {
        let mut q = world.query::<(&VehicleSprite, &ScreenPosition, &Rotation, &ZIndex)>();
        to_draw.extend(
            q.iter(world)
                .map(|(v, p, r, z)| (*z, Drawable::Vehicle(v.clone(), *p, *r))),
        );
    }

    to_draw.sort_by_key(|(z, _)| *z);

    for (_z, drawable) in to_draw.iter() {
        match drawable {
            Drawable::Lane(lane) => {
                for (a, b) in lane.segments() {
                    d.draw_line_ex(
                        Vector2::new(a.x as f32, a.y as f32),
                        Vector2::new(b.x as f32, b.y as f32),
                        lane.width as f32,
                        LANE_COLOR,
                    );
                }
            }
            Drawable::Lamp(lamp, pos) => {
                let (r, g, b) = lamp.color.rgb();
                d.draw_circle_v(
                    Vector2::new(pos.x() as f32, pos.y() as f32),
                    lamp.radius as f32,
                    Color::new(r, g, b, 255),
                );
                d.draw_circle_lines(
                    pos.x() as i32,
                    pos.y() as i32,
                    lamp.radius as f32,
                    Color::BLACK,
                );
            }
            Drawable::Vehicle(sprite, pos, rot) => {
                // Rotate around the box center; the position is the top-left corner.
                let w = sprite.width as f32;
                let h = sprite.height as f32;
                let rec = Rectangle::new(pos.x() as f32 + w / 2.0, pos.y() as f32 + h / 2.0, w, h);
                d.draw_rectangle_pro(
                    rec,
                    Vector2::new(w / 2.0, h / 2.0),
                    rot.degrees as f32,
                    vehicle_color(sprite.kind),
                );
            }
        }
    }
}

pub fn render_debug_ui(world: &mut World, d: &mut RaylibDrawHandle) {
    if world.contains_resource::<DebugMode>() {
        let canvas = *world.resource::<CanvasSize>();
        let clock = *world.resource::<SimClock>();
        let stats = *world.resource::<SimStats>();
        let running = world.resource::<RunState>().is_running();

        let text = format!("DEBUG MODE (press F11 to toggle) | FPS: {}", d.get_fps());
        d.draw_text(&text, 10, 10, 10, Color::BLACK);

        let text = format!(
            "Step: {} | Time: {:.1}s | {}",
            clock.steps,
            clock.elapsed,
            if running { "running" } else { "paused" }
        );
        d.draw_text(&text, 10, 30, 10, Color::BLACK);

        let text = format!(
            "Vehicles: {} | Traffic lights: {} | Lanes: {}",
            stats.vehicles, stats.traffic_lights, stats.lanes
        );
        d.draw_text(&text, 10, 50, 10, Color::BLACK);

        let text = format!(
            "Fetch failures: {} (total {}) | Skipped passes: {} | Spawn failures: {}",
            stats.fetch_failures,
            stats.total_fetch_failures,
            stats.skipped_passes,
            stats.spawn_failures
        );
        d.draw_text(&text, 10, canvas.h as i32 - 20, 10, Color::BLACK);
    }
}
