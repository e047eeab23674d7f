//! Breeding pass — runs after lifecycle each tick (`DomainSet::Reproduction`).
//!
//! Cooldowns tick down first, then the eligible set is collected in stable
//! creation order. Each eligible agent rolls the per-tick reproduction
//! chance; on a hit it pairs with the remaining eligible partner of highest
//! compatibility, provided the score clears the viability bar. An agent
//! that bred this tick leaves the pool — nobody breeds twice per tick.
//! Actual births happen in the PostUpdate applicator.

use std::collections::BTreeSet;

use bevy_ecs::entity::Entity;
use bevy_ecs::message::MessageWriter;
use bevy_ecs::query::With;
use bevy_ecs::system::{Query, Res, ResMut};
use rand::Rng;

use crate::config::SimConfig;
use crate::ecs::clock::TickDelta;
use crate::ecs::commands::SimCommand;
use crate::ecs::components::{Agent, Lifecycle, Reproduction, TraitSet};
use crate::ecs::registry::AgentIndex;
use crate::ecs::resources::SimRng;
use crate::genetics;

pub fn pair_and_breed(
    delta: Res<TickDelta>,
    config: Res<SimConfig>,
    index: Res<AgentIndex>,
    mut rng: ResMut<SimRng>,
    mut agents: Query<(&mut Reproduction, &Lifecycle, &TraitSet), With<Agent>>,
    mut commands: MessageWriter<SimCommand>,
) {
    // Recovery periods elapse with simulated time.
    for (mut reproduction, _, _) in agents.iter_mut() {
        if reproduction.cooldown > 0.0 {
            reproduction.cooldown -= delta.0;
        }
    }

    // Eligible set in stable creation order.
    let eligible: Vec<Entity> = index
        .in_creation_order()
        .filter(|&entity| {
            agents
                .get(entity)
                .map(|(reproduction, lifecycle, _)| reproduction.can_reproduce(lifecycle))
                .unwrap_or(false)
        })
        .collect();

    let rng = &mut rng.rng;
    let mut bred: BTreeSet<Entity> = BTreeSet::new();

    for &candidate in &eligible {
        if bred.contains(&candidate) {
            continue;
        }
        if !rng.random_bool(config.reproduction_chance) {
            continue;
        }
        let Ok((_, _, candidate_traits)) = agents.get(candidate) else {
            continue;
        };

        // Highest-compatibility partner still in the pool; creation order
        // breaks ties (strict greater-than keeps the earliest).
        let mut best: Option<(Entity, f64)> = None;
        for &partner in &eligible {
            if partner == candidate || bred.contains(&partner) {
                continue;
            }
            let Ok((_, _, partner_traits)) = agents.get(partner) else {
                continue;
            };
            let score = genetics::compatibility(candidate_traits, partner_traits);
            if best.map(|(_, top)| score > top).unwrap_or(true) {
                best = Some((partner, score));
            }
        }

        // No eligible partner is a no-op, not an error.
        let Some((partner, score)) = best else {
            continue;
        };
        if score < config.compatibility_threshold {
            tracing::debug!(
                score,
                threshold = config.compatibility_threshold,
                "best pairing below viability bar; skipping"
            );
            continue;
        }

        bred.insert(candidate);
        bred.insert(partner);
        commands.write(SimCommand::Breed {
            parent_a: candidate,
            parent_b: partner,
        });
    }
}
