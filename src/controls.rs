use ::rand as external_rand;
use external_rand::Rng;
use macroquad::prelude::*;
use tracing::warn;

use sproutsim::environment::ControlInput;
use sproutsim::simulation::Simulation;

const PERCENT_STEP: f32 = 5.0;
const TEMPERATURE_STEP: f32 = 1.0;

/// Slider values held by the viewer; fed into the simulation on change.
pub struct ControlState {
    pub input: ControlInput,
    pub take_screenshot: bool,
}

impl ControlState {
    pub fn from_simulation(sim: &Simulation) -> Self {
        Self {
            input: sim.environment.to_controls(),
            take_screenshot: false,
        }
    }
}

fn nudge(value: &mut f32, delta: f32, min: f32, max: f32) -> bool {
    let next = (*value + delta).clamp(min, max);
    let changed = next != *value;
    *value = next;
    changed
}

pub fn handle_controls<R: Rng>(sim: &mut Simulation, state: &mut ControlState, rng: &mut R) {
    if is_key_pressed(KeyCode::Space) {
        sim.toggle_pause();
    }

    if is_key_pressed(KeyCode::R) {
        sim.reset(rng);
    }

    if is_key_pressed(KeyCode::G) {
        sim.toggle_fast_growth();
    }

    // Single-shot growth, the "simulate on click" mode
    if is_key_pressed(KeyCode::Enter) {
        sim.simulate(rng);
    }

    let archetype_keys = [
        (KeyCode::Key1, "tree"),
        (KeyCode::Key2, "succulent"),
        (KeyCode::Key3, "algae"),
    ];
    for (key, name) in archetype_keys {
        if is_key_pressed(key) {
            if let Err(err) = sim.set_archetype(name, rng) {
                warn!(%err, "archetype switch rejected");
            }
        }
    }

    let input = &mut state.input;
    let mut changed = false;
    if is_key_pressed(KeyCode::L) {
        changed |= nudge(&mut input.light, PERCENT_STEP, 0.0, 100.0);
    }
    if is_key_pressed(KeyCode::K) {
        changed |= nudge(&mut input.light, -PERCENT_STEP, 0.0, 100.0);
    }
    if is_key_pressed(KeyCode::P) {
        changed |= nudge(&mut input.spectrum, PERCENT_STEP, 0.0, 100.0);
    }
    if is_key_pressed(KeyCode::O) {
        changed |= nudge(&mut input.spectrum, -PERCENT_STEP, 0.0, 100.0);
    }
    if is_key_pressed(KeyCode::T) {
        changed |= nudge(&mut input.temperature, TEMPERATURE_STEP, -40.0, 60.0);
    }
    if is_key_pressed(KeyCode::Y) {
        changed |= nudge(&mut input.temperature, -TEMPERATURE_STEP, -40.0, 60.0);
    }
    if is_key_pressed(KeyCode::H) {
        changed |= nudge(&mut input.humidity, PERCENT_STEP, 0.0, 100.0);
    }
    if is_key_pressed(KeyCode::J) {
        changed |= nudge(&mut input.humidity, -PERCENT_STEP, 0.0, 100.0);
    }
    if changed {
        sim.set_controls(input);
    }

    if is_key_pressed(KeyCode::F12) {
        state.take_screenshot = true;
    }
}
