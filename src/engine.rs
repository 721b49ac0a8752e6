// Growth engine: advances an organism by one time step.

use serde::Serialize;
use std::f32::consts::{PI, TAU};
use tracing::debug;

use crate::archetype::ArchetypeParams;
use crate::config::SimulationConfig;
use crate::environment::EnvironmentSample;
use crate::growth::GrowthFactor;
use crate::organism::{AlgaeBody, Body, BranchBody, Organism, UP};
use crate::random::GrowthRandom;
use crate::types::lerp;

/// Thinnest segment a taper will produce (unless the parent is already thinner).
pub const MIN_THICKNESS: f32 = 1.0;
/// Progress a tip needs before it extends.
pub const EXTENSION_THRESHOLD: f32 = 1.0;

/// What happened during one `step`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub extensions: usize,
    pub laterals: usize,
    pub pruned: usize,
}

/// Branching and extension rules, parameterized from the simulation config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthEngine {
    pub node_cap: usize,
    pub prune_retain: usize,
    pub lateral_max_depth: u32,
    pub base_branch_prob: f32,
}

impl GrowthEngine {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            node_cap: config.node_cap,
            prune_retain: config.prune_retain,
            lateral_max_depth: config.lateral_max_depth,
            base_branch_prob: config.base_branch_prob,
        }
    }

    /// Advances `organism` by `dt` (negative or non-finite dt counts as zero).
    pub fn step<G: GrowthRandom + ?Sized>(
        &self,
        organism: &mut Organism,
        factor: &GrowthFactor,
        sample: &EnvironmentSample,
        dt: f32,
        rng: &mut G,
    ) -> StepOutcome {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let params = organism.archetype.params();
        organism.health = factor.health;
        match &mut organism.body {
            Body::Branching(body) => {
                organism.biomass += params.biomass_rate * dt * factor.growth_rate;
                self.grow_branches(body, params, factor, sample, dt, rng)
            }
            Body::Algae(body) => {
                organism.biomass +=
                    params.biomass_rate * dt * sample.light * (1.0 + sample.spectrum * 0.6);
                grow_blades(body, sample, dt);
                StepOutcome::default()
            }
        }
    }

    /// Probability of a lateral branch next to an extension from a tip at `depth`.
    pub fn branch_probability(&self, params: &ArchetypeParams, depth: u32) -> f32 {
        (self.base_branch_prob * params.branch_multiplier * (1.0 - depth as f32 * 0.12)).max(0.0)
    }

    fn grow_branches<G: GrowthRandom + ?Sized>(
        &self,
        body: &mut BranchBody,
        params: &ArchetypeParams,
        factor: &GrowthFactor,
        sample: &EnvironmentSample,
        dt: f32,
        rng: &mut G,
    ) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        let progress = tip_speed(factor, params) * dt;

        // Only tips that existed before this step grow.
        for idx in body.tip_indices() {
            let tip = body.node_mut(idx);
            if tip.depth >= params.max_depth {
                continue;
            }
            tip.grown += progress;
            if tip.grown < EXTENSION_THRESHOLD {
                continue;
            }
            tip.grown = 0.0;
            let (angle, length, thickness, depth) = (tip.angle, tip.length, tip.thickness, tip.depth);

            let child_angle = angle + turn(angle, depth, sample, rng);
            let child_length = if length > 0.0 {
                length * rng.range(0.6, 1.05)
            } else {
                rng.range(8.0, 20.0) * params.length_scale
            };
            let child_thickness = taper(thickness, 0.75);
            body.push_child(idx, child_angle, child_length, child_thickness);
            outcome.extensions += 1;

            if depth < self.lateral_max_depth && rng.chance(self.branch_probability(params, depth)) {
                let lateral_angle = angle + rng.range(-1.6, 1.6);
                let lateral_length = child_length * rng.range(0.6, 0.95);
                body.push_child(idx, lateral_angle, lateral_length, taper(child_thickness, 0.8));
                outcome.laterals += 1;
            }
        }

        outcome.pruned = body.prune(self.node_cap, self.prune_retain);
        if outcome.pruned > 0 {
            debug!(pruned = outcome.pruned, remaining = body.len(), "pruned branch nodes");
        }
        outcome
    }
}

/// Progress per unit dt for every growing tip.
pub fn tip_speed(factor: &GrowthFactor, params: &ArchetypeParams) -> f32 {
    0.6 * factor.health * factor.growth_rate * params.growth_speed * 0.05
}

/// Scaled thickness that never drops below `MIN_THICKNESS` nor grows past `thickness`.
fn taper(thickness: f32, ratio: f32) -> f32 {
    (thickness * ratio).max(MIN_THICKNESS).min(thickness)
}

/// Signed smallest rotation from `from` to `to`, in `[-PI, PI)`.
fn angle_between(from: f32, to: f32) -> f32 {
    (to - from + PI).rem_euclid(TAU) - PI
}

/// Heading change for a primary extension. Blue light pulls toward vertical,
/// red widens the random spread, and light adds a weaker upward pull.
fn turn<G: GrowthRandom + ?Sized>(angle: f32, depth: u32, sample: &EnvironmentSample, rng: &mut G) -> f32 {
    let damping = (1.0 - depth as f32 * 0.15).max(0.25);
    let spread = lerp(1.3, 0.7, sample.spectrum);
    let wander = rng.range(-0.7, 0.7) * spread * damping;
    let pull = lerp(0.0, 0.35, sample.spectrum) + 0.1 * sample.light;
    wander + angle_between(angle, UP) * pull
}

fn grow_blades(body: &mut AlgaeBody, sample: &EnvironmentSample, dt: f32) {
    let boost = 0.8 + sample.light * 1.2;
    for blade in &mut body.blades {
        blade.length = (blade.length + blade.growth * dt * boost).clamp(0.0, body.max_length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::Archetype;
    use crate::growth;
    use crate::random::ScriptedRandom;
    use crate::types::Point;
    use ::rand::rngs::StdRng;
    use ::rand::SeedableRng;
    use std::collections::HashMap;

    fn optimum(light: f32, spectrum: f32) -> EnvironmentSample {
        EnvironmentSample::new(light, 22.0, 1.0, spectrum)
    }

    fn run(organism: &mut Organism, engine: &GrowthEngine, sample: &EnvironmentSample, dt: f32, rng: &mut StdRng) -> StepOutcome {
        let factor = growth::compute(sample, organism.archetype, organism.health);
        engine.step(organism, &factor, sample, dt, rng)
    }

    fn assert_tree_invariants(body: &BranchBody) {
        let by_id: HashMap<_, _> = body.nodes().iter().map(|n| (n.id, n)).collect();
        assert_eq!(by_id.len(), body.len(), "ids must be unique");
        assert_eq!(body.nodes().iter().filter(|n| n.parent.is_none()).count(), 1);
        assert_eq!(body.root().parent, None);
        for node in body.nodes() {
            if let Some(pid) = node.parent {
                let parent = by_id.get(&pid).expect("parent present");
                assert_eq!(node.depth, parent.depth + 1);
                // parents are created first, so ids strictly increase along edges
                assert!(parent.id < node.id);
                assert!(node.thickness <= parent.thickness);
            }
        }
    }

    #[test]
    fn single_step_from_root_extends_once() {
        let config = SimulationConfig::default();
        let engine = GrowthEngine::from_config(&config);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut org = Organism::new(Archetype::Branching, &config, &mut rng);
            let outcome = run(&mut org, &engine, &optimum(1.0, 0.5), 40.0, &mut rng);
            let body = org.branches().unwrap();
            assert!(body.len() == 2 || body.len() == 3);
            assert_eq!(outcome.extensions, 1);
            assert!(body.nodes()[1..].iter().all(|n| n.depth == 1 && n.parent == Some(0)));
            assert_eq!(org.health, 1.0);
        }
    }

    #[test]
    fn scripted_extension_is_exact() {
        let config = SimulationConfig::default();
        let engine = GrowthEngine::from_config(&config);
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let mut org = Organism::new(Archetype::Branching, &config, &mut rng);
        let sample = optimum(1.0, 0.5);
        let factor = growth::compute(&sample, org.archetype, org.health);
        let outcome = engine.step(&mut org, &factor, &sample, 40.0, &mut rng);
        assert_eq!(outcome, StepOutcome { extensions: 1, laterals: 0, pruned: 0 });

        let body = org.branches().unwrap();
        let root = body.root().clone();
        assert_eq!(root.length, 19.0);
        assert_eq!(root.thickness, 11.0);
        let child = &body.nodes()[1];
        assert!((child.angle - UP).abs() < 1e-6);
        assert!((child.length - 19.0 * 0.825).abs() < 1e-4);
        assert!((child.thickness - 8.25).abs() < 1e-6);
        assert_eq!(child.origin, root.position);
        let expected = Point::new(root.position.x, root.position.y - child.length);
        assert!((child.position.x - expected.x).abs() < 1e-3);
        assert!((child.position.y - expected.y).abs() < 1e-3);
        assert_eq!(body.root().grown, 0.0);
    }

    #[test]
    fn forced_laterals_share_depth() {
        let config = SimulationConfig::default();
        let engine = GrowthEngine::from_config(&config);
        // a zero sample makes every chance() succeed
        let mut rng = ScriptedRandom::new(vec![0.0]);
        let mut org = Organism::new(Archetype::Branching, &config, &mut rng);
        let sample = optimum(1.0, 0.0);
        let factor = growth::compute(&sample, org.archetype, org.health);
        let outcome = engine.step(&mut org, &factor, &sample, 40.0, &mut rng);
        assert_eq!(outcome.laterals, 1);
        let body = org.branches().unwrap();
        assert_eq!(body.len(), 3);
        assert_eq!(body.nodes()[2].depth, 1);
        assert_eq!(body.child_count(0), 2);
    }

    #[test]
    fn small_steps_accumulate_before_extending() {
        let config = SimulationConfig::default();
        let engine = GrowthEngine::from_config(&config);
        let mut rng = StdRng::seed_from_u64(11);
        let mut org = Organism::new(Archetype::Branching, &config, &mut rng);
        let sample = optimum(1.0, 0.5);
        run(&mut org, &engine, &sample, 1.0, &mut rng);
        assert_eq!(org.node_count(), 1);
        assert!(org.branches().unwrap().root().grown > 0.0);
    }

    #[test]
    fn no_light_no_growth() {
        let config = SimulationConfig::default();
        let engine = GrowthEngine::from_config(&config);
        let mut rng = StdRng::seed_from_u64(2);
        let mut org = Organism::new(Archetype::Branching, &config, &mut rng);
        let biomass = org.biomass;
        for _ in 0..100 {
            run(&mut org, &engine, &optimum(0.0, 0.5), 10.0, &mut rng);
        }
        assert_eq!(org.node_count(), 1);
        assert_eq!(org.biomass, biomass);
    }

    #[test]
    fn long_runs_keep_tree_invariants() {
        let config = SimulationConfig::default();
        let engine = GrowthEngine::from_config(&config);
        for archetype in [Archetype::Branching, Archetype::Succulent] {
            for seed in 0..10 {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut org = Organism::new(archetype, &config, &mut rng);
                for i in 0..200 {
                    let sample = EnvironmentSample::new(1.0, 22.0, 1.0, (i % 10) as f32 / 10.0);
                    run(&mut org, &engine, &sample, 30.0, &mut rng);
                }
                let body = org.branches().unwrap();
                assert!(body.nodes().iter().all(|n| n.depth <= archetype.params().max_depth));
                assert_tree_invariants(body);
            }
        }
    }

    #[test]
    fn pruning_bounds_bushy_growth() {
        let config = SimulationConfig {
            node_cap: 300,
            prune_retain: 50,
            ..SimulationConfig::default()
        };
        let engine = GrowthEngine::from_config(&config);
        let mut rng = ScriptedRandom::new(vec![0.0]);
        let mut org = Organism::new(Archetype::Branching, &config, &mut rng);
        let sample = optimum(1.0, 0.5);
        let mut pruned = 0;
        for _ in 0..60 {
            let factor = growth::compute(&sample, org.archetype, org.health);
            pruned += engine.step(&mut org, &factor, &sample, 40.0, &mut rng).pruned;
            let body = org.branches().unwrap();
            assert!(body.len() <= config.node_cap);
            assert_eq!(body.root().id, 0);
            assert_eq!(body.root().parent, None);
        }
        assert!(pruned > 0);
        assert_tree_invariants(org.branches().unwrap());
    }

    #[test]
    fn terminal_depth_never_extends() {
        let config = SimulationConfig::default();
        let engine = GrowthEngine::from_config(&config);
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let mut org = Organism::new(Archetype::Succulent, &config, &mut rng);
        let sample = optimum(1.0, 0.5);
        // without laterals the succulent is a chain that stops at max depth
        for _ in 0..200 {
            let factor = growth::compute(&sample, org.archetype, org.health);
            engine.step(&mut org, &factor, &sample, 500.0, &mut rng);
        }
        let max_depth = Archetype::Succulent.params().max_depth;
        let body = org.branches().unwrap();
        assert_eq!(body.len() as u32, max_depth + 1);
        let tip = body.tips().next().unwrap();
        assert_eq!(tip.depth, max_depth);
        assert_eq!(tip.grown, 0.0);
    }

    #[test]
    fn branch_probability_decays_with_depth() {
        let engine = GrowthEngine::from_config(&SimulationConfig::default());
        let tree = Archetype::Branching.params();
        let succ = Archetype::Succulent.params();
        assert!((engine.branch_probability(tree, 0) - 0.18).abs() < 1e-6);
        assert!(engine.branch_probability(tree, 3) < engine.branch_probability(tree, 1));
        assert_eq!(engine.branch_probability(tree, 12), 0.0);
        assert!(engine.branch_probability(succ, 0) < 0.01);
    }

    #[test]
    fn blue_light_pulls_toward_vertical() {
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let tilted = UP + 1.0;
        let blue = turn(tilted, 0, &EnvironmentSample::new(0.0, 22.0, 0.5, 1.0), &mut rng);
        let red = turn(tilted, 0, &EnvironmentSample::new(0.0, 22.0, 0.5, 0.0), &mut rng);
        assert!(blue < 0.0);
        assert_eq!(red, 0.0);
    }

    #[test]
    fn algae_scenario_matches_closed_form() {
        let config = SimulationConfig::default();
        let engine = GrowthEngine::from_config(&config);
        let mut rng = StdRng::seed_from_u64(5);
        let mut org = Organism::new(Archetype::Algae, &config, &mut rng);
        let start: Vec<_> = org.blades().unwrap().to_vec();
        let sample = EnvironmentSample::new(1.0, 18.0, 0.5, 0.5);
        let mut previous = start.clone();
        for _ in 0..100 {
            run(&mut org, &engine, &sample, 1.0, &mut rng);
            let now = org.blades().unwrap();
            for (a, b) in previous.iter().zip(now) {
                assert!(b.length >= a.length);
                assert!(b.length <= config.blade_max_length);
            }
            previous = now.to_vec();
        }
        for (initial, blade) in start.iter().zip(org.blades().unwrap()) {
            let expected = (initial.length + 100.0 * initial.growth * 2.0).min(config.blade_max_length);
            assert!((blade.length - expected).abs() < 1e-2);
        }
        assert_eq!(org.node_count(), 0);
        assert!((org.biomass - (0.1 + 100.0 * 0.0006 * 1.3)).abs() < 1e-4);
    }

    #[test]
    fn algae_blades_stop_at_max_length() {
        let config = SimulationConfig {
            blade_max_length: 120.0,
            ..SimulationConfig::default()
        };
        let engine = GrowthEngine::from_config(&config);
        let mut rng = StdRng::seed_from_u64(8);
        let mut org = Organism::new(Archetype::Algae, &config, &mut rng);
        for _ in 0..50 {
            run(&mut org, &engine, &optimum(1.0, 1.0), 100.0, &mut rng);
        }
        assert!(org.blades().unwrap().iter().all(|b| b.length == 120.0));
    }

    #[test]
    fn negative_dt_is_ignored() {
        let config = SimulationConfig::default();
        let engine = GrowthEngine::from_config(&config);
        let mut rng = StdRng::seed_from_u64(4);
        let mut org = Organism::new(Archetype::Algae, &config, &mut rng);
        let before: Vec<f32> = org.blades().unwrap().iter().map(|b| b.length).collect();
        run(&mut org, &engine, &optimum(1.0, 1.0), -5.0, &mut rng);
        let after: Vec<f32> = org.blades().unwrap().iter().map(|b| b.length).collect();
        assert_eq!(before, after);
    }
}
