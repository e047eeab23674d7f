//! Ageing pass — runs first each tick (`DomainSet::Lifecycle`).
//!
//! Advances every agent's age by the tick's simulated delta, rederives the
//! life stage, and queues anyone past `max_age` for removal. Removals are
//! only applied by the PostUpdate applicator, after the full population
//! has been scanned; the iteration set is never mutated mid-scan.

use bevy_ecs::entity::Entity;
use bevy_ecs::message::MessageWriter;
use bevy_ecs::query::With;
use bevy_ecs::system::{Query, Res};

use crate::config::SimConfig;
use crate::ecs::clock::TickDelta;
use crate::ecs::commands::SimCommand;
use crate::ecs::components::{Agent, AgentCore, LifeStage, Lifecycle};

pub fn advance_lifecycles(
    delta: Res<TickDelta>,
    config: Res<SimConfig>,
    mut agents: Query<(Entity, &AgentCore, &mut Lifecycle), With<Agent>>,
    mut commands: MessageWriter<SimCommand>,
) {
    for (entity, core, mut lifecycle) in agents.iter_mut() {
        if lifecycle.age < 0.0 {
            tracing::warn!(agent = %core.id, age = lifecycle.age, "negative age clamped to 0");
            lifecycle.age = 0.0;
        }
        lifecycle.age += delta.0;
        lifecycle.stage = LifeStage::from_age(lifecycle.age, &config);

        if lifecycle.age >= lifecycle.max_age {
            commands.write(SimCommand::RemoveAgent { entity });
        }
    }
}
