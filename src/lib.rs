//! Procedural plant growth model: environment-driven growth rates, a
//! branching engine for trees and succulents, a blade model for algae, and a
//! renderer-agnostic exporter.

pub mod api;
pub mod archetype;
pub mod config;
pub mod engine;
pub mod environment;
pub mod error;
pub mod export;
pub mod growth;
pub mod organism;
pub mod random;
pub mod simulation;
pub mod types;

pub use archetype::Archetype;
pub use config::SimulationConfig;
pub use environment::{ControlInput, EnvironmentSample};
pub use error::GrowthError;
pub use export::{export, DrawPrimitive, ViewParams};
pub use organism::Organism;
pub use simulation::Simulation;
