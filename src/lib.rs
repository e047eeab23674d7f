//! Agent population simulator on an entity-component core.
//!
//! Agents carry identity, bounded heritable traits, lifecycle state, and
//! lineage as components on a headless Bevy world. A manually-driven tick
//! schedule ages the population, pairs compatible adults, and applies
//! births and deaths after each scan. [`WorldSimulation`] is the only
//! entry point callers need.

pub mod config;
pub mod ecs;
pub mod error;
pub mod genetics;
pub mod persist;
pub mod simulation;

pub use config::SimConfig;
pub use ecs::components::{
    Agent, AgentCore, LifeStage, Lifecycle, Lineage, Reproduction, TraitDomain, TraitSet,
};
pub use error::SimError;
pub use persist::{AgentSnapshot, ClockSnapshot};
pub use simulation::{
    AgentSeed, CompatibilityReport, LineageReport, MateCandidate, SimulationStatus,
    WorldSimulation,
};
