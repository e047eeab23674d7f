//! Trait inheritance and compatibility scoring.
//!
//! Offspring traits are derived exactly once, at creation, from both
//! parents' trait sets: averaged per key (missing keys read as the neutral
//! 0.5), nudged by a bounded mutation delta, and clamped back into
//! [0.0, 1.0]. Compatibility is a personality-only similarity score in
//! [0, 1]; spirit and style never enter it.

use std::collections::BTreeSet;

use bevy_ecs::entity::Entity;
use bevy_ecs::world::World;
use rand::{Rng, RngCore};

use crate::config::SimConfig;
use crate::ecs::components::{AgentCore, Lifecycle, Lineage, Reproduction, TraitSet};
use crate::ecs::registry::{self, AgentIndex};
use crate::ecs::resources::SimRng;
use crate::error::SimError;

/// Value assumed for a trait key one side does not carry.
pub const NEUTRAL_TRAIT: f64 = 0.5;

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Personality similarity of two agents: `1 - mean(|a[k] - b[k]|)` over the
/// union of personality keys, missing keys defaulting to [`NEUTRAL_TRAIT`].
/// An empty union scores 1.0 (nothing to disagree on).
pub fn compatibility(a: &TraitSet, b: &TraitSet) -> f64 {
    let keys: BTreeSet<&String> = a.personality.keys().chain(b.personality.keys()).collect();
    if keys.is_empty() {
        return 1.0;
    }
    let total: f64 = keys
        .iter()
        .map(|key| {
            let left = a.personality.get(*key).copied().unwrap_or(NEUTRAL_TRAIT);
            let right = b.personality.get(*key).copied().unwrap_or(NEUTRAL_TRAIT);
            (left - right).abs()
        })
        .sum();
    1.0 - total / keys.len() as f64
}

fn inherit_map(
    p1: &std::collections::BTreeMap<String, f64>,
    p2: &std::collections::BTreeMap<String, f64>,
    config: &SimConfig,
    rng: &mut dyn RngCore,
    mutation_count: &mut u32,
) -> std::collections::BTreeMap<String, f64> {
    let keys: BTreeSet<&String> = p1.keys().chain(p2.keys()).collect();
    let mut child = std::collections::BTreeMap::new();
    for key in keys {
        let a = p1.get(key).copied().unwrap_or(NEUTRAL_TRAIT);
        let b = p2.get(key).copied().unwrap_or(NEUTRAL_TRAIT);
        let delta: f64 = rng.random_range(-config.mutation_bound..=config.mutation_bound);
        if delta.abs() > config.mutation_epsilon {
            *mutation_count += 1;
        }
        child.insert(key.clone(), clamp01((a + b) / 2.0 + delta));
    }
    child
}

/// Derive a child trait set from two parents. Independent mutation delta
/// per key, uniform in [-mutation_bound, +mutation_bound]; deltas whose
/// magnitude exceeds `mutation_epsilon` count toward `mutation_count`.
pub fn inherit_traits(
    p1: &TraitSet,
    p2: &TraitSet,
    config: &SimConfig,
    rng: &mut dyn RngCore,
) -> TraitSet {
    let mut mutation_count = 0;
    let personality = inherit_map(&p1.personality, &p2.personality, config, rng, &mut mutation_count);
    let physical = inherit_map(&p1.physical, &p2.physical, config, rng, &mut mutation_count);
    let abilities = inherit_map(&p1.abilities, &p2.abilities, config, rng, &mut mutation_count);
    TraitSet {
        personality,
        physical,
        abilities,
        mutation_count,
    }
}

fn agent_id_or_debug(index: &AgentIndex, entity: Entity) -> String {
    index
        .id(entity)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{entity:?}"))
}

/// Create an offspring of two parent entities under the given id.
///
/// Fails with `UnknownEntity` if either parent is missing its trait or
/// identity components, and `DuplicateEntity` on an id collision. The
/// child starts as an age-0 infant with zeroed reproduction state and
/// `parents = [a, b]`; both parents get the child appended, their
/// offspring count bumped, and their cooldown reset to the configured
/// recovery period. The new entity is immediately queryable.
pub fn spawn_offspring(
    world: &mut World,
    parent_a: Entity,
    parent_b: Entity,
    offspring_id: &str,
) -> Result<Entity, SimError> {
    let config = world.resource::<SimConfig>().clone();

    let (id_a, id_b) = {
        let index = world.resource::<AgentIndex>();
        if index.contains(offspring_id) {
            return Err(SimError::DuplicateEntity(offspring_id.to_string()));
        }
        (
            agent_id_or_debug(index, parent_a),
            agent_id_or_debug(index, parent_b),
        )
    };

    let traits_a = world
        .get::<TraitSet>(parent_a)
        .cloned()
        .ok_or_else(|| SimError::UnknownEntity(id_a.clone()))?;
    let traits_b = world
        .get::<TraitSet>(parent_b)
        .cloned()
        .ok_or_else(|| SimError::UnknownEntity(id_b.clone()))?;
    let core_a = world
        .get::<AgentCore>(parent_a)
        .cloned()
        .ok_or_else(|| SimError::UnknownEntity(id_a.clone()))?;
    let core_b = world
        .get::<AgentCore>(parent_b)
        .cloned()
        .ok_or_else(|| SimError::UnknownEntity(id_b.clone()))?;

    // Inherited identity: each categorical tag comes from a random parent.
    let (child_traits, spirit, style) = {
        let mut rng_res = world.resource_mut::<SimRng>();
        let rng = &mut rng_res.rng;
        let traits = inherit_traits(&traits_a, &traits_b, &config, rng);
        let spirit = if rng.random_bool(0.5) {
            core_a.spirit.clone()
        } else {
            core_b.spirit.clone()
        };
        let style = if rng.random_bool(0.5) {
            core_a.style.clone()
        } else {
            core_b.style.clone()
        };
        (traits, spirit, style)
    };

    let child = registry::spawn_agent(
        world,
        AgentCore {
            id: offspring_id.to_string(),
            name: offspring_id.to_string(),
            spirit,
            style,
        },
        child_traits,
        Lifecycle::newborn(&config),
        Reproduction::fresh(&config),
        Lineage::of(&id_a, &id_b),
    )?;

    for parent in parents_once(parent_a, parent_b) {
        if let Some(mut lineage) = world.get_mut::<Lineage>(parent) {
            lineage.children.push(offspring_id.to_string());
        }
        if let Some(mut reproduction) = world.get_mut::<Reproduction>(parent) {
            reproduction.offspring_count += 1;
            reproduction.cooldown = config.reproduction_cooldown;
        }
    }

    Ok(child)
}

/// Both parents, deduplicated so a self-pairing is not double-counted.
fn parents_once(a: Entity, b: Entity) -> impl Iterator<Item = Entity> {
    std::iter::once(a).chain((a != b).then_some(b))
}
