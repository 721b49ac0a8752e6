// Growth factor calculator: environment + archetype -> growth rate and health.

use serde::Serialize;

use crate::archetype::Archetype;
use crate::environment::EnvironmentSample;

pub const MIN_HEALTH: f32 = 0.05;
pub const MAX_HEALTH: f32 = 1.0;
/// Width of the temperature bell curve, °C.
pub const TEMPERATURE_TOLERANCE: f32 = 8.0;
/// Weight kept from the previous health value on each update.
pub const HEALTH_INERTIA: f32 = 0.98;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GrowthFactor {
    pub growth_rate: f32,
    pub health: f32,
    pub temp_factor: f32,
}

/// Bell curve peaking at 1 when `temperature == optimal`.
pub fn temperature_fitness(temperature: f32, optimal: f32) -> f32 {
    let d = (temperature - optimal) / TEMPERATURE_TOLERANCE;
    (-(d * d)).exp()
}

/// Growth rate in `[0, 1 + spectrum_weight]`: zero without light, non-decreasing
/// in light and humidity, blue light helps.
pub fn growth_rate(sample: &EnvironmentSample, archetype: Archetype) -> f32 {
    let p = archetype.params();
    let light = sample.light.clamp(0.0, 1.0);
    let humidity = sample.humidity.clamp(0.0, 1.0);
    let spectrum = sample.spectrum.clamp(0.0, 1.0);
    let water = p.humidity_floor + (1.0 - p.humidity_floor) * humidity;
    light * water * (1.0 + p.spectrum_weight * spectrum)
}

/// Exponentially smoothed health step toward the temperature fitness.
pub fn smooth_health(previous: f32, temp_factor: f32) -> f32 {
    let previous = if previous.is_finite() { previous } else { MAX_HEALTH };
    (previous * HEALTH_INERTIA + temp_factor * (1.0 - HEALTH_INERTIA)).clamp(MIN_HEALTH, MAX_HEALTH)
}

pub fn compute(sample: &EnvironmentSample, archetype: Archetype, previous_health: f32) -> GrowthFactor {
    let temp_factor = temperature_fitness(sample.temperature, archetype.params().optimal_temperature);
    GrowthFactor {
        growth_rate: growth_rate(sample, archetype),
        health: smooth_health(previous_health, temp_factor),
        temp_factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(light: f32, temperature: f32, humidity: f32, spectrum: f32) -> EnvironmentSample {
        EnvironmentSample::new(light, temperature, humidity, spectrum)
    }

    #[test]
    fn fitness_peaks_at_optimum() {
        assert!((temperature_fitness(22.0, 22.0) - 1.0).abs() < 1e-6);
        assert!(temperature_fitness(30.0, 22.0) < 0.4);
        assert!(temperature_fitness(62.0, 22.0) < 1e-6);
    }

    #[test]
    fn zero_light_means_zero_growth() {
        for a in Archetype::ALL {
            assert_eq!(compute(&sample(0.0, 22.0, 1.0, 1.0), a, 1.0).growth_rate, 0.0);
        }
    }

    #[test]
    fn growth_is_monotone_in_light_and_humidity() {
        for a in Archetype::ALL {
            let mut last = -1.0;
            for i in 0..=10 {
                let r = growth_rate(&sample(i as f32 / 10.0, 22.0, 0.5, 0.5), a);
                assert!(r >= last);
                last = r;
            }
            let mut last = -1.0;
            for i in 0..=10 {
                let r = growth_rate(&sample(0.8, 22.0, i as f32 / 10.0, 0.5), a);
                assert!(r >= last);
                last = r;
            }
        }
    }

    #[test]
    fn growth_is_bounded() {
        for a in Archetype::ALL {
            let r = growth_rate(&sample(1.0, 22.0, 1.0, 1.0), a);
            assert!(r <= 1.0 + a.params().spectrum_weight + 1e-6);
        }
    }

    #[test]
    fn far_from_optimum_health_moves_slowly() {
        let f = compute(&sample(1.0, 62.0, 0.5, 0.5), Archetype::Branching, 1.0);
        assert!(f.temp_factor < 1e-6);
        assert!((f.health - 0.98).abs() < 1e-4);
    }

    #[test]
    fn health_decays_monotonically_and_converges() {
        let s = sample(1.0, 34.0, 0.5, 0.5);
        let target = temperature_fitness(34.0, 22.0);
        let mut health = 1.0;
        for _ in 0..500 {
            let next = compute(&s, Archetype::Branching, health).health;
            assert!(next <= health);
            health = next;
        }
        assert!((health - target.max(MIN_HEALTH)).abs() < 1e-3);
    }

    #[test]
    fn health_never_leaves_bounds() {
        let mut health = 1.0;
        for i in 0..500 {
            let t = if i % 2 == 0 { -40.0 } else { 60.0 };
            health = compute(&sample(0.3, t, 0.3, 0.3), Archetype::Algae, health).health;
            assert!((MIN_HEALTH..=MAX_HEALTH).contains(&health));
        }
        assert_eq!(smooth_health(f32::NAN, 0.0), 0.98);
        assert_eq!(smooth_health(0.0, 0.0), MIN_HEALTH);
    }
}
