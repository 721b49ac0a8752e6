use serde::Serialize;
use tracing::info;

use crate::archetype::Archetype;
use crate::config::SimulationConfig;
use crate::engine::{GrowthEngine, StepOutcome};
use crate::environment::{ControlInput, EnvironmentSample};
use crate::error::GrowthError;
use crate::export::{export, DrawPrimitive, ViewParams};
use crate::growth;
use crate::organism::Organism;
use crate::random::GrowthRandom;

/// Scalar state a status bar shows.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Status {
    pub archetype: &'static str,
    pub biomass: f32,
    pub health: f32,
    pub health_percent: u8,
    pub node_count: usize,
    pub tip_count: usize,
    pub blade_count: usize,
    pub tick: u64,
    pub paused: bool,
    pub speed_multiplier: f32,
}

// Simulation - owns the organism, the current environment and control flags
pub struct Simulation {
    pub organism: Organism,
    pub config: SimulationConfig,
    pub environment: EnvironmentSample,
    pub engine: GrowthEngine,
    pub paused: bool,
    pub speed_multiplier: f32,
    /// Seconds of simulated frame time, drives cosmetic sway.
    pub time: f32,
    pub tick: u64,
    pub last_outcome: StepOutcome,
}

impl Simulation {
    pub fn new<G: GrowthRandom + ?Sized>(rng: &mut G) -> Self {
        let config = SimulationConfig::default();
        let archetype = Archetype::Branching;
        Self::build(rng, config, archetype)
    }

    pub fn with_config<G: GrowthRandom + ?Sized>(rng: &mut G, config: SimulationConfig) -> Result<Self, GrowthError> {
        config.validate()?;
        let archetype = config.archetype()?;
        Ok(Self::build(rng, config, archetype))
    }

    fn build<G: GrowthRandom + ?Sized>(rng: &mut G, config: SimulationConfig, archetype: Archetype) -> Self {
        let organism = Organism::new(archetype, &config, rng);
        info!(archetype = %archetype, "created organism");
        Self {
            organism,
            environment: EnvironmentSample::from_controls(&config.environment),
            engine: GrowthEngine::from_config(&config),
            config,
            paused: false,
            speed_multiplier: 1.0,
            time: 0.0,
            tick: 0,
            last_outcome: StepOutcome::default(),
        }
    }

    pub fn archetype(&self) -> Archetype {
        self.organism.archetype
    }

    /// Replaces the organism with a fresh one of the current archetype.
    pub fn reset<G: GrowthRandom + ?Sized>(&mut self, rng: &mut G) {
        let fresh = Organism::new(self.archetype(), &self.config, rng);
        self.organism = fresh;
        self.time = 0.0;
        self.tick = 0;
        self.last_outcome = StepOutcome::default();
        info!(archetype = %self.archetype(), "simulation reset");
    }

    /// Switches archetype (by any accepted name) and resets. Unknown names leave
    /// the current organism untouched.
    pub fn set_archetype<G: GrowthRandom + ?Sized>(&mut self, name: &str, rng: &mut G) -> Result<Archetype, GrowthError> {
        let archetype: Archetype = name.parse()?;
        self.config.archetype = name.trim().to_string();
        self.organism = Organism::new(archetype, &self.config, rng);
        self.time = 0.0;
        self.tick = 0;
        self.last_outcome = StepOutcome::default();
        info!(%archetype, requested = name, "archetype changed");
        Ok(archetype)
    }

    pub fn set_controls(&mut self, input: &ControlInput) {
        self.environment = EnvironmentSample::from_controls(input);
    }

    pub fn set_environment(&mut self, sample: EnvironmentSample) {
        // re-clamp in case the caller built the struct by hand
        self.environment = EnvironmentSample::new(sample.light, sample.temperature, sample.humidity, sample.spectrum);
    }

    /// One growth step of length `dt` against the current environment.
    pub fn step<G: GrowthRandom + ?Sized>(&mut self, dt: f32, rng: &mut G) -> StepOutcome {
        let factor = growth::compute(&self.environment, self.archetype(), self.organism.health);
        let outcome = self.engine.step(&mut self.organism, &factor, &self.environment, dt, rng);
        self.tick = self.tick.wrapping_add(1);
        if dt.is_finite() && dt > 0.0 {
            self.time += dt * self.config.frame_ms / 1000.0;
        }
        self.last_outcome = outcome;
        outcome
    }

    /// Click mode: one unit step, regardless of pause and speed.
    pub fn simulate<G: GrowthRandom + ?Sized>(&mut self, rng: &mut G) -> StepOutcome {
        self.step(1.0, rng)
    }

    /// Frame mode: converts wall-clock milliseconds into a normalized dt.
    pub fn advance_frame<G: GrowthRandom + ?Sized>(&mut self, elapsed_ms: f32, rng: &mut G) -> Option<StepOutcome> {
        if self.paused {
            return None;
        }
        Some(self.step(self.frame_dt(elapsed_ms), rng))
    }

    pub fn frame_dt(&self, elapsed_ms: f32) -> f32 {
        (elapsed_ms.max(0.0) / self.config.frame_ms) * self.speed_multiplier
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn toggle_fast_growth(&mut self) {
        self.speed_multiplier = if self.is_fast() { 1.0 } else { self.config.fast_speed };
    }

    pub fn is_fast(&self) -> bool {
        self.speed_multiplier != 1.0
    }

    pub fn view(&self) -> ViewParams {
        ViewParams {
            time: self.time,
            light: self.environment.light,
            spectrum: self.environment.spectrum,
        }
    }

    pub fn primitives(&self) -> Vec<DrawPrimitive> {
        export(&self.organism, &self.view())
    }

    pub fn status(&self) -> Status {
        Status {
            archetype: self.archetype().name(),
            biomass: self.organism.biomass,
            health: self.organism.health,
            health_percent: self.organism.health_percent(),
            node_count: self.organism.node_count(),
            tip_count: self.organism.tip_count(),
            blade_count: self.organism.blades().map_or(0, <[_]>::len),
            tick: self.tick,
            paused: self.paused,
            speed_multiplier: self.speed_multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::rand::rngs::StdRng;
    use ::rand::SeedableRng;

    fn sim(seed: u64) -> (Simulation, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let sim = Simulation::new(&mut rng);
        (sim, rng)
    }

    #[test]
    fn starts_from_seed_biomass_and_full_health() {
        let (sim, _) = sim(1);
        let status = sim.status();
        assert_eq!(status.archetype, "branching");
        assert_eq!(status.biomass, 0.05);
        assert_eq!(status.health_percent, 100);
        assert_eq!(status.node_count, 1);
    }

    #[test]
    fn paused_frames_do_not_step() {
        let (mut sim, mut rng) = sim(2);
        sim.toggle_pause();
        assert!(sim.advance_frame(16.0, &mut rng).is_none());
        assert_eq!(sim.tick, 0);
        // click mode ignores pause
        sim.simulate(&mut rng);
        assert_eq!(sim.tick, 1);
    }

    #[test]
    fn fast_growth_scales_frame_dt() {
        let (mut sim, _) = sim(3);
        assert_eq!(sim.frame_dt(32.0), 2.0);
        sim.toggle_fast_growth();
        assert!(sim.is_fast());
        assert_eq!(sim.frame_dt(16.0), 6.0);
        sim.toggle_fast_growth();
        assert_eq!(sim.frame_dt(16.0), 1.0);
        assert_eq!(sim.frame_dt(-5.0), 0.0);
    }

    #[test]
    fn invalid_archetype_keeps_current_organism() {
        let (mut sim, mut rng) = sim(4);
        for _ in 0..50 {
            sim.advance_frame(160.0, &mut rng);
        }
        let before = sim.organism.node_count();
        let err = sim.set_archetype("moss", &mut rng).unwrap_err();
        assert!(matches!(err, GrowthError::InvalidArchetype(_)));
        assert_eq!(sim.archetype(), Archetype::Branching);
        assert_eq!(sim.organism.node_count(), before);
    }

    #[test]
    fn switching_archetype_resets() {
        let (mut sim, mut rng) = sim(5);
        for _ in 0..20 {
            sim.simulate(&mut rng);
        }
        assert_eq!(sim.set_archetype("algae", &mut rng).unwrap(), Archetype::Algae);
        let status = sim.status();
        assert_eq!(status.archetype, "algae");
        assert_eq!(status.blade_count, 18);
        assert_eq!(status.biomass, 0.1);
        assert_eq!(status.tick, 0);
        assert_eq!(sim.primitives().len(), 18);
    }

    #[test]
    fn controls_are_normalized() {
        let (mut sim, _) = sim(6);
        sim.set_controls(&ControlInput {
            light: 150.0,
            spectrum: 20.0,
            temperature: 30.0,
            humidity: 40.0,
        });
        assert_eq!(sim.environment.light, 1.0);
        assert!((sim.environment.spectrum - 0.2).abs() < 1e-6);
        assert_eq!(sim.environment.temperature, 30.0);
        assert_eq!(sim.view().light, 1.0);
    }

    #[test]
    fn hot_environment_drags_health_slowly() {
        let (mut sim, mut rng) = sim(7);
        sim.set_environment(EnvironmentSample::new(1.0, 62.0, 0.5, 0.5));
        sim.simulate(&mut rng);
        assert!((sim.organism.health - 0.98).abs() < 1e-4);
        for _ in 0..300 {
            sim.simulate(&mut rng);
        }
        assert!(sim.status().health_percent < 5 + 1);
        assert!(sim.organism.health >= growth::MIN_HEALTH);
    }

    #[test]
    fn reset_restores_seed_state() {
        let (mut sim, mut rng) = sim(8);
        for _ in 0..200 {
            sim.advance_frame(64.0, &mut rng);
        }
        assert!(sim.organism.biomass > 0.05);
        sim.reset(&mut rng);
        assert_eq!(sim.organism.biomass, 0.05);
        assert_eq!(sim.organism.node_count(), 1);
        assert_eq!(sim.time, 0.0);
    }

    #[test]
    fn with_config_rejects_unknown_archetype() {
        let mut rng = StdRng::seed_from_u64(9);
        let config = SimulationConfig {
            archetype: "lichen".into(),
            ..SimulationConfig::default()
        };
        assert!(Simulation::with_config(&mut rng, config).is_err());
    }
}
