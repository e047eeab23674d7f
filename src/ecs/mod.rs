pub mod app;
pub mod clock;
pub mod commands;
pub mod components;
pub mod registry;
pub mod resources;
pub mod schedule;
pub mod systems;

pub use app::{build_sim_app, build_sim_app_seeded};
pub use clock::{SimClock, TickDelta};
pub use commands::{SimCommand, apply_sim_commands};
pub use components::{
    Agent, AgentCore, LifeStage, Lifecycle, Lineage, Reproduction, TraitDomain, TraitSet,
};
pub use registry::{AgentIndex, IdAllocator};
pub use resources::SimRng;
pub use schedule::{DomainSet, SimPhase, SimTick, configure_sim_schedule};
