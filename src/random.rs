// Injectable random source for the growth engine.
//
// Every random draw in organism construction and stepping goes through this
// trait, so tests can replay a fixed sequence and assert exact topology.

use ::rand as external_rand;
use external_rand::Rng;

pub trait GrowthRandom {
    /// Uniform sample in `[0, 1)`.
    fn unit(&mut self) -> f32;

    /// Uniform sample in `[lo, hi)`; returns `lo` for an empty range.
    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        lo + self.unit() * (hi - lo)
    }

    /// True with probability `p` (clamped to `[0, 1]`).
    fn chance(&mut self, p: f32) -> bool {
        self.unit() < p.clamp(0.0, 1.0)
    }
}

impl<R: Rng> GrowthRandom for R {
    fn unit(&mut self) -> f32 {
        self.gen::<f32>()
    }
}

/// Replays a fixed list of unit samples, cycling when exhausted.
#[derive(Clone, Debug)]
pub struct ScriptedRandom {
    values: Vec<f32>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Number of samples consumed so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl GrowthRandom for ScriptedRandom {
    fn unit(&mut self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v.clamp(0.0, 0.999_999)
    }
}
