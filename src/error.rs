use thiserror::Error;

/// Errors surfaced by the growth core and its configuration layer.
#[derive(Debug, Error)]
pub enum GrowthError {
    /// Archetype name outside the known set (tree/flower/herb/branching, succulent, algae).
    #[error("invalid archetype: {0:?}")]
    InvalidArchetype(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse YAML config: {0}")]
    ConfigYaml(#[from] serde_yaml::Error),
    #[error("failed to parse JSON config: {0}")]
    ConfigJson(#[from] serde_json::Error),
}
