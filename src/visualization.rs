use macroquad::prelude::*;

use sproutsim::archetype::Archetype;
use sproutsim::config::SimulationConfig;
use sproutsim::environment::ControlInput;
use sproutsim::export::{ColorHint, DrawPrimitive};
use sproutsim::simulation::Status;
use sproutsim::types::Point;

fn hint_color(hint: &ColorHint) -> Color {
    let [r, g, b, a] = hint.rgba();
    Color::new(r, g, b, a)
}

fn to_vec(p: Point) -> Vec2 {
    vec2(p.x, p.y)
}

pub fn draw_background(archetype: Archetype, config: &SimulationConfig) {
    let (_, ground_y) = config.anchor(archetype);
    let (top, bottom, ground) = if archetype == Archetype::Algae {
        // water column over a sandy floor
        (
            Color::new(0.03, 0.23, 0.35, 1.0),
            Color::new(0.01, 0.20, 0.29, 1.0),
            Color::new(0.17, 0.14, 0.10, 1.0),
        )
    } else {
        (
            Color::new(0.04, 0.13, 0.19, 1.0),
            Color::new(0.03, 0.10, 0.11, 1.0),
            Color::new(0.05, 0.16, 0.10, 1.0),
        )
    };
    clear_background(top);
    let w = screen_width();
    let h = screen_height();
    // cheap vertical gradient in a few bands
    let bands = 8;
    for i in 0..bands {
        let t = i as f32 / bands as f32;
        let c = Color::new(
            top.r + (bottom.r - top.r) * t,
            top.g + (bottom.g - top.g) * t,
            top.b + (bottom.b - top.b) * t,
            1.0,
        );
        draw_rectangle(0.0, h * t, w, h / bands as f32 + 1.0, c);
    }
    draw_rectangle(0.0, ground_y, w, (h - ground_y).max(0.0), ground);
}

pub fn draw_primitives(primitives: &[DrawPrimitive]) {
    for primitive in primitives {
        match primitive {
            DrawPrimitive::Segment {
                from,
                to,
                thickness,
                color,
                ..
            } => {
                let c = hint_color(color);
                draw_line(from.x, from.y, to.x, to.y, *thickness, c);
                // round caps
                draw_circle(to.x, to.y, thickness / 2.0, c);
            }
            DrawPrimitive::LeafMark {
                position,
                orientation,
                size,
                color,
            } => {
                let base = *position;
                let tip = base.offset(*orientation, *size);
                let mid = base.offset(*orientation, size * 0.4);
                let side = orientation + std::f32::consts::FRAC_PI_2;
                let left = mid.offset(side, size * 0.2);
                let right = mid.offset(side, -size * 0.2);
                let c = hint_color(color);
                draw_triangle(to_vec(base), to_vec(left), to_vec(tip), c);
                draw_triangle(to_vec(base), to_vec(right), to_vec(tip), c);
            }
        }
    }
}

pub fn draw_light_overlay(light: f32) {
    draw_rectangle(
        0.0,
        0.0,
        screen_width(),
        screen_height(),
        Color::new(1.0, 0.92, 0.7, 0.02 + 0.08 * light),
    );
}

pub fn draw_stats_and_help(status: &Status, input: &ControlInput) {
    let fps = get_fps();
    let stats_text = format!(
        "Biomass: {:.3} | Health: {}% | Mode: {} | Nodes: {}",
        status.biomass, status.health_percent, status.archetype, status.node_count,
    );
    draw_text(&stats_text, 10.0, 20.0, 20.0, WHITE);
    let env_text = format!(
        "Light: {:.0} | Spectrum: {:.0} | Temp: {:.0}°C | Humidity: {:.0} | Speed: {:.0}x | FPS: {}",
        input.light, input.spectrum, input.temperature, input.humidity, status.speed_multiplier, fps,
    );
    draw_text(&env_text, 10.0, 40.0, 18.0, WHITE);
    if status.paused {
        draw_text("PAUSED - Press SPACE to resume", 10.0, 60.0, 20.0, YELLOW);
    }
    let help_color = Color::new(1.0, 1.0, 1.0, 0.7);
    draw_text(
        "SPACE=Pause | R=Reset | G=Grow fast | ENTER=Single step | 1/2/3=Tree/Succulent/Algae | F12=Screenshot",
        10.0,
        screen_height() - 30.0,
        16.0,
        help_color,
    );
    draw_text(
        "L/K=Light +/- | P/O=Spectrum +/- | T/Y=Temp +/- | H/J=Humidity +/-",
        10.0,
        screen_height() - 12.0,
        16.0,
        help_color,
    );
}
