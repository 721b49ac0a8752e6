// Global configuration and constants

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::archetype::Archetype;
use crate::environment::ControlInput;
use crate::error::GrowthError;

pub const DEFAULT_CONFIG_PATHS: [&str; 3] = ["config.yaml", "config.yml", "config.json"];

// Configuration struct for simulation parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // Canvas the root anchor is placed on
    pub canvas_width: f32,
    pub canvas_height: f32,

    // Structure bounds
    pub node_cap: usize,
    pub prune_retain: usize,
    pub lateral_max_depth: u32,
    pub base_branch_prob: f32,

    // Algae
    pub blade_count: usize,
    pub blade_max_length: f32,
    pub blade_spread: f32,

    // Driver
    pub frame_ms: f32,
    pub fast_speed: f32,
    pub archetype: String,
    pub seed: Option<u64>,

    // Initial control values (raw UI scale)
    pub environment: ControlInput,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            canvas_width: 900.0,
            canvas_height: 520.0,
            node_cap: 1000,
            prune_retain: 200,
            lateral_max_depth: 6,
            base_branch_prob: 0.18,
            blade_count: 18,
            blade_max_length: 600.0,
            blade_spread: 400.0,
            frame_ms: 16.0,
            fast_speed: 6.0,
            archetype: "tree".to_string(),
            seed: None,
            environment: ControlInput::default(),
        }
    }
}

impl SimulationConfig {
    /// Loads YAML (`.yaml`/`.yml`) or JSON (anything else) and validates it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GrowthError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GrowthError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let config = if is_yaml {
            Self::from_yaml_str(&text)?
        } else {
            Self::from_json_str(&text)?
        };
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, GrowthError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, GrowthError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Tries the default file names in the working directory, falling back to defaults.
    pub fn from_default_paths() -> Self {
        for candidate in DEFAULT_CONFIG_PATHS {
            if !Path::new(candidate).exists() {
                continue;
            }
            match Self::from_file(candidate) {
                Ok(config) => return config,
                Err(err) => warn!(path = candidate, %err, "ignoring unusable config file"),
            }
        }
        Self::default()
    }

    pub fn validate(&self) -> Result<(), GrowthError> {
        if self.node_cap == 0 {
            return Err(GrowthError::InvalidConfig("node_cap must be positive".into()));
        }
        if self.prune_retain == 0 || self.prune_retain >= self.node_cap {
            return Err(GrowthError::InvalidConfig(format!(
                "prune_retain must be in 1..{} (got {})",
                self.node_cap, self.prune_retain
            )));
        }
        if !(self.canvas_width > 0.0 && self.canvas_height > 0.0) {
            return Err(GrowthError::InvalidConfig("canvas size must be positive".into()));
        }
        if !(self.frame_ms > 0.0) {
            return Err(GrowthError::InvalidConfig("frame_ms must be positive".into()));
        }
        if !(self.fast_speed > 0.0) || !(self.blade_max_length > 0.0) {
            return Err(GrowthError::InvalidConfig(
                "fast_speed and blade_max_length must be positive".into(),
            ));
        }
        self.archetype()?;
        Ok(())
    }

    pub fn archetype(&self) -> Result<Archetype, GrowthError> {
        self.archetype.parse()
    }

    /// Root anchor (trunk base or sea floor centre) for an archetype.
    pub fn anchor(&self, archetype: Archetype) -> (f32, f32) {
        let ground = if archetype == Archetype::Algae { 0.9 } else { 0.88 };
        (self.canvas_width / 2.0, self.canvas_height * ground)
    }
}
