use bevy_ecs::entity::Entity;
use bevy_ecs::message::{Message, Messages};
use bevy_ecs::world::World;

use crate::ecs::registry::{self, AgentIndex, IdAllocator};
use crate::genetics;

/// Deferred structural changes emitted by the per-tick systems.
///
/// Systems never mutate the entity set mid-scan; they emit these via
/// `MessageWriter<SimCommand>` and the exclusive applicator in
/// `SimPhase::PostUpdate` applies them after the full population has been
/// processed.
#[derive(Message, Clone, Debug)]
pub enum SimCommand {
    /// Remove an agent that aged past its `max_age`.
    RemoveAgent { entity: Entity },
    /// Breed two eligible parents selected by the reproduction pass.
    Breed { parent_a: Entity, parent_b: Entity },
}

/// Exclusive system that drains pending `SimCommand` messages and applies
/// them. A failure on one command is logged and skipped so a single bad
/// entity cannot halt the rest of the tick.
pub fn apply_sim_commands(world: &mut World) {
    let commands: Vec<SimCommand> = {
        let Some(mut messages) = world.get_resource_mut::<Messages<SimCommand>>() else {
            return;
        };
        messages.drain().collect()
    };

    // Extracted while commands run; tick-born offspring draw ids from it.
    let mut allocator = world
        .remove_resource::<IdAllocator>()
        .expect("IdAllocator resource present");

    for command in commands {
        match command {
            SimCommand::RemoveAgent { entity } => {
                if let Some(id) = registry::despawn_agent(world, entity) {
                    tracing::info!(agent = %id, "agent reached max age and was removed");
                }
            }
            SimCommand::Breed { parent_a, parent_b } => {
                let offspring_id = allocator.allocate(world.resource::<AgentIndex>());
                match genetics::spawn_offspring(world, parent_a, parent_b, &offspring_id) {
                    Ok(_) => {
                        tracing::debug!(offspring = %offspring_id, "offspring born");
                    }
                    Err(err) => {
                        tracing::warn!(%err, "breeding failed for selected pair; skipping");
                    }
                }
            }
        }
    }

    world.insert_resource(allocator);
}
