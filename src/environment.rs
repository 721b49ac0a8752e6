// Environment snapshot read once per update.
//
// The raw UI scale (percent sliders, °C temperature) lives in `ControlInput`;
// everything downstream of `EnvironmentSample` works on normalized 0..1 values.

use serde::{Deserialize, Serialize};

pub const MIN_TEMPERATURE_C: f32 = -40.0;
pub const MAX_TEMPERATURE_C: f32 = 60.0;

/// Raw control values as a UI reports them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlInput {
    /// Light intensity, percent (0..100).
    pub light: f32,
    /// Spectrum, percent (0 = red, 100 = blue).
    pub spectrum: f32,
    /// Temperature in °C.
    pub temperature: f32,
    /// Humidity / water, percent (0..100).
    pub humidity: f32,
}

impl Default for ControlInput {
    fn default() -> Self {
        Self {
            light: 70.0,
            spectrum: 50.0,
            temperature: 22.0,
            humidity: 60.0,
        }
    }
}

/// Immutable per-tick environment, all fields normalized.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSample {
    pub light: f32,
    pub temperature: f32,
    pub humidity: f32,
    pub spectrum: f32,
}

fn unit(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl EnvironmentSample {
    /// Builds a sample from already-normalized values, clamping out-of-range input.
    pub fn new(light: f32, temperature: f32, humidity: f32, spectrum: f32) -> Self {
        let temperature = if temperature.is_finite() {
            temperature.clamp(MIN_TEMPERATURE_C, MAX_TEMPERATURE_C)
        } else {
            MIN_TEMPERATURE_C
        };
        Self {
            light: unit(light),
            temperature,
            humidity: unit(humidity),
            spectrum: unit(spectrum),
        }
    }

    /// Normalizes raw percent controls by /100; temperature passes through in °C.
    pub fn from_controls(input: &ControlInput) -> Self {
        Self::new(
            input.light / 100.0,
            input.temperature,
            input.humidity / 100.0,
            input.spectrum / 100.0,
        )
    }

    /// Inverse of `from_controls`, used when reporting state back to a UI.
    pub fn to_controls(&self) -> ControlInput {
        ControlInput {
            light: self.light * 100.0,
            spectrum: self.spectrum * 100.0,
            temperature: self.temperature,
            humidity: self.humidity * 100.0,
        }
    }
}

impl Default for EnvironmentSample {
    fn default() -> Self {
        Self::from_controls(&ControlInput::default())
    }
}
