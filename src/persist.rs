//! Save/load of the full simulation state through an injectable directory.
//!
//! Two files, written atomically enough for a single cooperative process:
//! `clock.json` (clock + id-allocator bookkeeping) and `agents.jsonl` (one
//! agent per line, in stable creation order, with every core component).
//! Two simulations over the same directory share nothing in memory; state
//! moves between them only through explicit save/load round-trips.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use bevy_ecs::entity::Entity;
use bevy_ecs::world::World;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::ecs::clock::SimClock;
use crate::ecs::components::{AgentCore, Lifecycle, Lineage, Reproduction, TraitSet};
use crate::ecs::registry::{self, AgentIndex, IdAllocator};
use crate::error::SimError;

const AGENTS_FILE: &str = "agents.jsonl";
const CLOCK_FILE: &str = "clock.json";

/// One agent's complete core component set, component-wise equal to the
/// live entity it was taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub core: AgentCore,
    pub traits: TraitSet,
    pub lifecycle: Lifecycle,
    pub reproduction: Reproduction,
    pub lineage: Lineage,
}

/// Clock and bookkeeping state saved alongside the population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub time: f64,
    pub acceleration: f64,
    pub tick_count: u64,
    pub next_agent_serial: u64,
}

/// Write an iterator of serializable items to a JSONL file (one JSON
/// object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SimError> {
    let text = fs::read_to_string(path)?;
    let mut items = Vec::new();
    for line in text.lines().filter(|line| !line.is_empty()) {
        items.push(serde_json::from_str(line)?);
    }
    Ok(items)
}

/// Capture one agent's core components. `None` when the entity is missing
/// any of them (not a core-managed agent).
pub fn snapshot_agent(world: &World, entity: Entity) -> Option<AgentSnapshot> {
    Some(AgentSnapshot {
        core: world.get::<AgentCore>(entity)?.clone(),
        traits: world.get::<TraitSet>(entity)?.clone(),
        lifecycle: world.get::<Lifecycle>(entity)?.clone(),
        reproduction: world.get::<Reproduction>(entity)?.clone(),
        lineage: world.get::<Lineage>(entity)?.clone(),
    })
}

/// Serialize the clock and every agent to the given directory, creating it
/// if needed.
pub fn save_world(world: &World, dir: &Path) -> Result<(), SimError> {
    fs::create_dir_all(dir)?;

    let clock = world.resource::<SimClock>();
    let snapshot = ClockSnapshot {
        time: clock.time,
        acceleration: clock.acceleration,
        tick_count: clock.tick_count,
        next_agent_serial: world.resource::<IdAllocator>().serial(),
    };
    fs::write(
        dir.join(CLOCK_FILE),
        serde_json::to_string_pretty(&snapshot)?,
    )?;

    let index = world.resource::<AgentIndex>();
    let agents = index
        .in_creation_order()
        .filter_map(|entity| snapshot_agent(world, entity));
    write_jsonl(&dir.join(AGENTS_FILE), agents)?;

    tracing::info!(dir = %dir.display(), agents = index.len(), "simulation state saved");
    Ok(())
}

/// Read a previously saved state from the directory.
pub fn read_state(dir: &Path) -> Result<(ClockSnapshot, Vec<AgentSnapshot>), SimError> {
    let clock: ClockSnapshot =
        serde_json::from_str(&fs::read_to_string(dir.join(CLOCK_FILE))?)?;
    let agents = read_jsonl(&dir.join(AGENTS_FILE))?;
    Ok((clock, agents))
}

/// Rebuild a fresh world from a saved state, preserving creation order so
/// subsequent ticks iterate identically to the saved run.
pub fn restore_world(
    world: &mut World,
    clock: ClockSnapshot,
    agents: Vec<AgentSnapshot>,
) -> Result<(), SimError> {
    for agent in agents {
        registry::spawn_agent(
            world,
            agent.core,
            agent.traits,
            agent.lifecycle,
            agent.reproduction,
            agent.lineage,
        )?;
    }

    {
        let mut clock_res = world.resource_mut::<SimClock>();
        clock_res.time = clock.time;
        clock_res.acceleration = clock.acceleration;
        clock_res.tick_count = clock.tick_count;
    }
    world
        .resource_mut::<IdAllocator>()
        .resume_from(clock.next_agent_serial);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_snapshot_round_trips_through_json() {
        let mut traits = TraitSet::default();
        traits.personality.insert("curiosity".into(), 0.625);
        traits.physical.insert("stamina".into(), 0.1);
        traits.mutation_count = 3;

        let snapshot = AgentSnapshot {
            core: AgentCore {
                id: "a1".into(),
                name: "Asha".into(),
                spirit: "raven".into(),
                style: "restless".into(),
            },
            traits,
            lifecycle: Lifecycle {
                age: 27.5,
                stage: crate::ecs::components::LifeStage::Adult,
                maturity_age: 18.0,
                max_age: 100.0,
            },
            reproduction: Reproduction {
                cooldown: 4.25,
                offspring_count: 2,
                max_offspring: 5,
            },
            lineage: Lineage {
                parents: vec!["p1".into(), "p2".into()],
                children: vec!["c1".into()],
            },
        };

        let line = serde_json::to_string(&snapshot).unwrap();
        let back: AgentSnapshot = serde_json::from_str(&line).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn missing_directory_surfaces_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("never-saved");
        let err = read_state(&missing).unwrap_err();
        assert!(matches!(err, SimError::Persistence(_)));
    }
}
