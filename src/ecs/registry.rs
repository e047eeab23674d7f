use std::collections::BTreeMap;

use bevy_ecs::entity::Entity;
use bevy_ecs::resource::Resource;
use bevy_ecs::world::World;

use crate::ecs::components::{Agent, AgentCore, Lifecycle, Lineage, Reproduction, TraitSet};
use crate::error::SimError;

/// Bidirectional mapping between agent ids (opaque strings) and ECS
/// entities, plus the stable creation order the reproduction pass and the
/// persistence layer iterate in.
#[derive(Resource, Debug, Clone, Default)]
pub struct AgentIndex {
    to_entity: BTreeMap<String, Entity>,
    to_id: BTreeMap<Entity, String>,
    creation_order: Vec<Entity>,
}

impl AgentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping. Panics if the id is already registered; callers
    /// check `contains` first and surface `DuplicateEntity` themselves.
    pub fn insert(&mut self, id: String, entity: Entity) {
        let prev = self.to_entity.insert(id.clone(), entity);
        assert!(prev.is_none(), "duplicate agent id {id} in AgentIndex");
        self.to_id.insert(entity, id);
        self.creation_order.push(entity);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.to_entity.contains_key(id)
    }

    pub fn entity(&self, id: &str) -> Option<Entity> {
        self.to_entity.get(id).copied()
    }

    pub fn id(&self, entity: Entity) -> Option<&str> {
        self.to_id.get(&entity).map(String::as_str)
    }

    /// Drop the mapping for an entity, preserving the relative order of
    /// the survivors.
    pub fn remove(&mut self, entity: Entity) -> Option<String> {
        let id = self.to_id.remove(&entity)?;
        self.to_entity.remove(&id);
        self.creation_order.retain(|&e| e != entity);
        Some(id)
    }

    /// Entities in stable creation order.
    pub fn in_creation_order(&self) -> impl Iterator<Item = Entity> + '_ {
        self.creation_order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.to_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_entity.is_empty()
    }
}

/// Id source for agents born inside a tick, where no external collaborator
/// is present to supply one. Caller-facing creation ops never use this.
#[derive(Resource, Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Next unused `agent-<n>` id, skipping anything already registered.
    pub fn allocate(&mut self, index: &AgentIndex) -> String {
        loop {
            let id = format!("agent-{}", self.next);
            self.next += 1;
            if !index.contains(&id) {
                return id;
            }
        }
    }

    pub fn serial(&self) -> u64 {
        self.next
    }

    pub fn resume_from(&mut self, serial: u64) {
        self.next = serial;
    }
}

/// Spawn a fully formed agent and register it in the index. The entity is
/// visible to queries immediately; there is no deferred commit.
pub fn spawn_agent(
    world: &mut World,
    core: AgentCore,
    traits: TraitSet,
    lifecycle: Lifecycle,
    reproduction: Reproduction,
    lineage: Lineage,
) -> Result<Entity, SimError> {
    let id = core.id.clone();
    if world.resource::<AgentIndex>().contains(&id) {
        return Err(SimError::DuplicateEntity(id));
    }

    let entity = world
        .spawn((Agent, core, traits, lifecycle, reproduction, lineage))
        .id();
    world.resource_mut::<AgentIndex>().insert(id, entity);
    Ok(entity)
}

/// Despawn an agent and drop its index entry. Peer-subsystem components on
/// the entity are removed along with it. Missing entities are logged, not
/// fatal: removal may race with a same-tick death.
pub fn despawn_agent(world: &mut World, entity: Entity) -> Option<String> {
    let id = world.resource_mut::<AgentIndex>().remove(entity);
    match id {
        Some(ref id) => {
            if !world.despawn(entity) {
                tracing::warn!(agent = %id, "despawn found no live entity");
            }
        }
        None => {
            tracing::warn!(?entity, "despawn requested for unregistered entity");
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    fn test_world() -> World {
        let mut world = World::new();
        world.insert_resource(AgentIndex::new());
        world
    }

    fn core(id: &str) -> AgentCore {
        AgentCore {
            id: id.to_string(),
            name: id.to_string(),
            spirit: "fox".to_string(),
            style: "wanderer".to_string(),
        }
    }

    fn spawn(world: &mut World, id: &str) -> Entity {
        let cfg = SimConfig::default();
        spawn_agent(
            world,
            core(id),
            TraitSet::default(),
            Lifecycle::newborn(&cfg),
            Reproduction::fresh(&cfg),
            Lineage::root(),
        )
        .unwrap()
    }

    #[test]
    fn spawn_registers_and_is_queryable() {
        let mut world = test_world();
        let entity = spawn(&mut world, "a1");
        assert_eq!(world.resource::<AgentIndex>().entity("a1"), Some(entity));
        assert_eq!(world.get::<AgentCore>(entity).unwrap().id, "a1");
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut world = test_world();
        spawn(&mut world, "a1");
        let cfg = SimConfig::default();
        let err = spawn_agent(
            &mut world,
            core("a1"),
            TraitSet::default(),
            Lifecycle::newborn(&cfg),
            Reproduction::fresh(&cfg),
            Lineage::root(),
        )
        .unwrap_err();
        assert!(matches!(err, SimError::DuplicateEntity(ref id) if id == "a1"));
    }

    #[test]
    fn despawn_removes_entity_and_mapping() {
        let mut world = test_world();
        let entity = spawn(&mut world, "a1");
        let removed = despawn_agent(&mut world, entity);
        assert_eq!(removed.as_deref(), Some("a1"));
        assert!(world.resource::<AgentIndex>().entity("a1").is_none());
        assert!(world.get::<AgentCore>(entity).is_none());
    }

    #[test]
    fn creation_order_is_stable_across_removal() {
        let mut world = test_world();
        let a = spawn(&mut world, "a");
        let b = spawn(&mut world, "b");
        let c = spawn(&mut world, "c");
        despawn_agent(&mut world, b);

        let order: Vec<Entity> = world
            .resource::<AgentIndex>()
            .in_creation_order()
            .collect();
        assert_eq!(order, vec![a, c]);
    }

    #[test]
    fn allocator_skips_taken_ids() {
        let mut world = test_world();
        spawn(&mut world, "agent-0");
        let mut alloc = IdAllocator::default();
        let index = world.resource::<AgentIndex>().clone();
        assert_eq!(alloc.allocate(&index), "agent-1");
        assert_eq!(alloc.allocate(&index), "agent-2");
    }
}
