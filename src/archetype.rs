// Plant archetypes and their fixed parameter records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GrowthError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    /// Trees, flowers and herbs.
    Branching,
    Succulent,
    Algae,
}

/// Per-archetype constants, looked up by `Archetype::params`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ArchetypeParams {
    /// Temperature at which health converges to 1, °C.
    pub optimal_temperature: f32,
    /// Tips at or beyond this depth never extend.
    pub max_depth: u32,
    /// Multiplier on the base lateral-branch probability.
    pub branch_multiplier: f32,
    /// Root thickness range.
    pub base_thickness: (f32, f32),
    pub base_leaf_size: f32,
    /// Scales tip growth progress.
    pub growth_speed: f32,
    /// Biomass gained per unit dt at growth rate 1.
    pub biomass_rate: f32,
    pub seed_biomass: f32,
    /// Weight of spectrum (blue share) in the growth rate.
    pub spectrum_weight: f32,
    /// Minimum humidity contribution to the growth rate.
    pub humidity_floor: f32,
    /// Base length scale for children of zero-length parents.
    pub length_scale: f32,
    pub leaf_saturation: f32,
    pub stem_hue: f32,
}

const BRANCHING: ArchetypeParams = ArchetypeParams {
    optimal_temperature: 22.0,
    max_depth: 14,
    branch_multiplier: 1.0,
    base_thickness: (8.0, 14.0),
    base_leaf_size: 14.0,
    growth_speed: 1.0,
    biomass_rate: 0.0008,
    seed_biomass: 0.05,
    spectrum_weight: 0.3,
    humidity_floor: 0.5,
    length_scale: 1.0,
    leaf_saturation: 65.0,
    stem_hue: 95.0,
};

const SUCCULENT: ArchetypeParams = ArchetypeParams {
    optimal_temperature: 22.0,
    max_depth: 8,
    branch_multiplier: 0.03,
    base_thickness: (8.0, 14.0),
    base_leaf_size: 8.0,
    growth_speed: 0.35,
    biomass_rate: 0.0008,
    seed_biomass: 0.05,
    spectrum_weight: 0.2,
    // succulents barely care about water
    humidity_floor: 0.85,
    length_scale: 0.6,
    leaf_saturation: 70.0,
    stem_hue: 115.0,
};

const ALGAE: ArchetypeParams = ArchetypeParams {
    optimal_temperature: 18.0,
    max_depth: 0,
    branch_multiplier: 0.0,
    base_thickness: (4.0, 10.0),
    base_leaf_size: 0.0,
    growth_speed: 1.0,
    biomass_rate: 0.0006,
    seed_biomass: 0.1,
    spectrum_weight: 0.6,
    humidity_floor: 1.0,
    length_scale: 1.0,
    leaf_saturation: 60.0,
    stem_hue: 180.0,
};

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::Branching, Archetype::Succulent, Archetype::Algae];

    pub fn params(self) -> &'static ArchetypeParams {
        match self {
            Archetype::Branching => &BRANCHING,
            Archetype::Succulent => &SUCCULENT,
            Archetype::Algae => &ALGAE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Archetype::Branching => "branching",
            Archetype::Succulent => "succulent",
            Archetype::Algae => "algae",
        }
    }

    pub fn is_branching(self) -> bool {
        !matches!(self, Archetype::Algae)
    }
}

impl FromStr for Archetype {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tree" | "flower" | "herb" | "branching" => Ok(Archetype::Branching),
            "succulent" => Ok(Archetype::Succulent),
            "algae" => Ok(Archetype::Algae),
            _ => Err(GrowthError::InvalidArchetype(s.to_string())),
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
