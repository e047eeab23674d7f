use bevy_app::App;
use bevy_ecs::message::MessageRegistry;
use bevy_ecs::schedule::IntoScheduleConfigs;

use crate::config::SimConfig;
use crate::ecs::clock::{SimClock, TickDelta};
use crate::ecs::commands::{SimCommand, apply_sim_commands};
use crate::ecs::registry::{AgentIndex, IdAllocator};
use crate::ecs::resources::SimRng;
use crate::ecs::schedule::{DomainSet, SimPhase, configure_sim_schedule};
use crate::ecs::systems::{advance_lifecycles, pair_and_breed};

/// Build a headless Bevy app with the clock, registry resources, command
/// message type, and the lifecycle → reproduction → applicator tick wired
/// into a manually-run `SimTick` schedule. Seeded from `config.seed`.
pub fn build_sim_app(config: SimConfig) -> App {
    let seed = config.seed;
    build_sim_app_seeded(config, seed)
}

/// Build the app with an explicit RNG seed overriding `config.seed`.
pub fn build_sim_app_seeded(config: SimConfig, seed: u64) -> App {
    let mut app = App::empty();

    app.insert_resource(SimClock::new());
    app.insert_resource(TickDelta::default());
    app.insert_resource(AgentIndex::new());
    app.insert_resource(IdAllocator::default());
    app.insert_resource(SimRng::seeded(seed));
    app.insert_resource(config);

    MessageRegistry::register_message::<SimCommand>(app.world_mut());

    let mut schedule = configure_sim_schedule();
    schedule.add_systems(bevy_ecs::message::message_update_system.in_set(SimPhase::PreUpdate));
    schedule.add_systems(advance_lifecycles.in_set(DomainSet::Lifecycle));
    schedule.add_systems(pair_and_breed.in_set(DomainSet::Reproduction));
    schedule.add_systems(apply_sim_commands.in_set(SimPhase::PostUpdate));
    app.add_schedule(schedule);
    app
}
