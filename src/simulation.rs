//! Caller-facing facade over the headless ECS app.
//!
//! `WorldSimulation` owns the app and exposes the operations collaborators
//! drive: agent creation, explicit breeding, tick advancement with time
//! acceleration, population queries, and save/load. Systems inside the
//! tick schedule never reach out; everything external funnels through
//! here.

use bevy_app::App;
use bevy_ecs::entity::Entity;
use rand::Rng;
use serde::Serialize;

use crate::config::SimConfig;
use crate::ecs::app::build_sim_app_seeded;
use crate::ecs::clock::{SimClock, TickDelta};
use crate::ecs::components::{
    AgentCore, Lifecycle, LifeStage, Lineage, Reproduction, TraitDomain, TraitSet,
};
use crate::ecs::registry::{self, AgentIndex};
use crate::ecs::resources::SimRng;
use crate::ecs::schedule::SimTick;
use crate::error::SimError;
use crate::genetics;
use crate::persist::{self, AgentSnapshot};

/// Everything a caller supplies to create an agent. Trait maps given here
/// are taken verbatim; when `parents` is set they instead override the
/// inherited values key by key.
#[derive(Debug, Clone, Default)]
pub struct AgentSeed {
    pub name: String,
    pub spirit: String,
    pub style: String,
    pub personality: Vec<(String, f64)>,
    pub physical: Vec<(String, f64)>,
    pub abilities: Vec<(String, f64)>,
    /// Ids of two existing agents to inherit traits and lineage from.
    pub parents: Option<(String, String)>,
    pub age: Option<f64>,
    pub maturity_age: Option<f64>,
    pub max_age: Option<f64>,
    pub max_offspring: Option<u32>,
}

/// Point-in-time summary of the running simulation. Reading it never
/// mutates anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationStatus {
    pub simulation_time: f64,
    pub time_acceleration: f64,
    pub total_agents: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MateCandidate {
    pub id: String,
    pub compatibility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatibilityReport {
    pub compatibility: f64,
    pub recommended: bool,
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineageReport {
    pub id: String,
    pub parents: Vec<String>,
    pub children: Vec<String>,
    pub is_founder: bool,
}

/// The simulation engine. One instance per independent world; no state is
/// shared between instances except through explicit save/load.
pub struct WorldSimulation {
    app: App,
}

impl WorldSimulation {
    pub fn new(config: SimConfig) -> Self {
        let seed = config.seed;
        Self::with_seed(config, seed)
    }

    pub fn with_seed(config: SimConfig, seed: u64) -> Self {
        Self {
            app: build_sim_app_seeded(config, seed),
        }
    }

    /// Direct access to the underlying world, for peer subsystems that
    /// attach their own components to agent entities.
    pub fn world(&self) -> &bevy_ecs::world::World {
        self.app.world()
    }

    pub fn world_mut(&mut self) -> &mut bevy_ecs::world::World {
        self.app.world_mut()
    }

    fn entity_of(&self, id: &str) -> Result<Entity, SimError> {
        self.world()
            .resource::<AgentIndex>()
            .entity(id)
            .ok_or_else(|| SimError::UnknownEntity(id.to_string()))
    }

    /// Create an agent under a caller-chosen id. With `parents` set, the
    /// child inherits traits (with mutation) and categorical identity from
    /// both, and lineage links are recorded in both directions; explicit
    /// trait entries in the seed override the inherited values.
    pub fn create_agent_with_inheritance(
        &mut self,
        id: &str,
        seed: AgentSeed,
    ) -> Result<Entity, SimError> {
        let config = self.world().resource::<SimConfig>().clone();
        if self.world().resource::<AgentIndex>().contains(id) {
            return Err(SimError::DuplicateEntity(id.to_string()));
        }

        let parent_entities = match &seed.parents {
            Some((a, b)) => Some((self.entity_of(a)?, self.entity_of(b)?)),
            None => None,
        };

        let (mut traits, mut spirit, mut style) =
            (TraitSet::default(), seed.spirit.clone(), seed.style.clone());
        if let Some((pa, pb)) = parent_entities {
            let traits_a = self.world().get::<TraitSet>(pa).cloned().unwrap_or_default();
            let traits_b = self.world().get::<TraitSet>(pb).cloned().unwrap_or_default();
            let core_a = self.world().get::<AgentCore>(pa).cloned();
            let core_b = self.world().get::<AgentCore>(pb).cloned();

            let mut rng_res = self.world_mut().resource_mut::<SimRng>();
            let rng = &mut rng_res.rng;
            traits = genetics::inherit_traits(&traits_a, &traits_b, &config, rng);
            if spirit.is_empty()
                && let (Some(a), Some(b)) = (&core_a, &core_b)
            {
                spirit = if rng.random_bool(0.5) {
                    a.spirit.clone()
                } else {
                    b.spirit.clone()
                };
            }
            if style.is_empty()
                && let (Some(a), Some(b)) = (&core_a, &core_b)
            {
                style = if rng.random_bool(0.5) {
                    a.style.clone()
                } else {
                    b.style.clone()
                };
            }
        }

        for (key, value) in &seed.personality {
            traits.personality.insert(key.clone(), *value);
        }
        for (key, value) in &seed.physical {
            traits.physical.insert(key.clone(), *value);
        }
        for (key, value) in &seed.abilities {
            traits.abilities.insert(key.clone(), *value);
        }
        traits.validate()?;

        let lifecycle = Lifecycle {
            age: seed.age.unwrap_or(0.0),
            stage: LifeStage::from_age(seed.age.unwrap_or(0.0), &config),
            maturity_age: seed.maturity_age.unwrap_or(config.default_maturity_age),
            max_age: seed.max_age.unwrap_or(config.default_max_age),
        };
        let reproduction = Reproduction {
            cooldown: 0.0,
            offspring_count: 0,
            max_offspring: seed.max_offspring.unwrap_or(config.default_max_offspring),
        };
        let lineage = match &seed.parents {
            Some((a, b)) => Lineage::of(a, b),
            None => Lineage::root(),
        };
        let name = if seed.name.is_empty() {
            id.to_string()
        } else {
            seed.name.clone()
        };

        let entity = registry::spawn_agent(
            self.world_mut(),
            AgentCore {
                id: id.to_string(),
                name,
                spirit,
                style,
            },
            traits,
            lifecycle,
            reproduction,
            lineage,
        )?;

        if let Some((pa, pb)) = parent_entities {
            let world = self.world_mut();
            for parent in [pa, pb] {
                if let Some(mut lineage) = world.get_mut::<Lineage>(parent) {
                    lineage.children.push(id.to_string());
                }
            }
        }

        tracing::info!(agent = %id, parents = ?seed.parents, "agent created");
        Ok(entity)
    }

    /// Breed two existing agents immediately, outside the tick schedule.
    /// Cooldowns and offspring caps on the parents are updated exactly as
    /// for tick-driven births.
    pub fn create_offspring(
        &mut self,
        parent_a: &str,
        parent_b: &str,
        offspring_id: &str,
    ) -> Result<Entity, SimError> {
        let pa = self.entity_of(parent_a)?;
        let pb = self.entity_of(parent_b)?;
        genetics::spawn_offspring(self.world_mut(), pa, pb, offspring_id)
    }

    /// Remove an agent from the world. Its lineage links in other agents
    /// are left intact as history.
    pub fn remove_agent(&mut self, id: &str) -> Result<(), SimError> {
        let entity = self.entity_of(id)?;
        registry::despawn_agent(self.world_mut(), entity);
        Ok(())
    }

    /// Advance the simulation by one tick. `real_delta` is wall-clock
    /// time; the simulated delta is `real_delta * acceleration`. Negative
    /// input is clamped to zero so time never runs backwards.
    pub fn update_simulation(&mut self, real_delta: f64) {
        let real_delta = if real_delta < 0.0 {
            tracing::warn!(real_delta, "negative tick delta clamped to zero");
            0.0
        } else {
            real_delta
        };
        let delta = real_delta * self.world().resource::<SimClock>().acceleration;
        self.run_tick(delta);
    }

    /// Advance simulated time by an exact amount, ignoring acceleration.
    /// One full tick pass runs, so deaths and births triggered by the jump
    /// apply immediately.
    pub fn nudge_time(&mut self, amount: f64) {
        if amount < 0.0 {
            tracing::warn!(amount, "negative time nudge ignored");
            return;
        }
        self.run_tick(amount);
    }

    fn run_tick(&mut self, delta: f64) {
        let world = self.world_mut();
        world.resource_mut::<TickDelta>().0 = delta;
        world.resource_mut::<SimClock>().advance(delta);
        world.run_schedule(SimTick);
    }

    /// Change the time acceleration factor for subsequent updates.
    /// Non-finite or non-positive factors are rejected with a warning and
    /// the previous factor stays in effect.
    pub fn accelerate_time(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            tracing::warn!(factor, "ignoring invalid time acceleration");
            return;
        }
        self.world_mut().resource_mut::<SimClock>().acceleration = factor;
        tracing::debug!(factor, "time acceleration set");
    }

    pub fn get_simulation_status(&self) -> SimulationStatus {
        let clock = self.world().resource::<SimClock>();
        SimulationStatus {
            simulation_time: clock.time,
            time_acceleration: clock.acceleration,
            total_agents: self.world().resource::<AgentIndex>().len(),
        }
    }

    /// Rank every other mature agent by trait compatibility with the
    /// subject, best first. Ties keep creation order.
    pub fn find_compatible_mates(
        &self,
        id: &str,
        max_results: usize,
    ) -> Result<Vec<MateCandidate>, SimError> {
        let subject = self.entity_of(id)?;
        let world = self.world();
        let subject_traits = world
            .get::<TraitSet>(subject)
            .ok_or_else(|| SimError::UnknownEntity(id.to_string()))?;

        let index = world.resource::<AgentIndex>();
        let mut candidates: Vec<MateCandidate> = index
            .in_creation_order()
            .filter(|&entity| entity != subject)
            .filter_map(|entity| {
                let lifecycle = world.get::<Lifecycle>(entity)?;
                if !lifecycle.is_adult() {
                    return None;
                }
                let traits = world.get::<TraitSet>(entity)?;
                Some(MateCandidate {
                    id: index.id(entity)?.to_string(),
                    compatibility: genetics::compatibility(subject_traits, traits),
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.compatibility
                .partial_cmp(&a.compatibility)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(max_results);
        Ok(candidates)
    }

    /// Score a prospective pairing and say whether it clears the viability
    /// threshold.
    pub fn analyze_genetic_compatibility(
        &self,
        id_a: &str,
        id_b: &str,
    ) -> Result<CompatibilityReport, SimError> {
        let ea = self.entity_of(id_a)?;
        let eb = self.entity_of(id_b)?;
        let world = self.world();
        let ta = world
            .get::<TraitSet>(ea)
            .ok_or_else(|| SimError::UnknownEntity(id_a.to_string()))?;
        let tb = world
            .get::<TraitSet>(eb)
            .ok_or_else(|| SimError::UnknownEntity(id_b.to_string()))?;

        let compatibility = genetics::compatibility(ta, tb);
        let threshold = world.resource::<SimConfig>().compatibility_threshold;
        let recommended = compatibility >= threshold;
        let analysis = if recommended {
            format!("pairing {id_a} with {id_b} is viable at {compatibility:.3}")
        } else {
            format!(
                "pairing {id_a} with {id_b} scores {compatibility:.3}, below the {threshold:.3} viability floor"
            )
        };
        Ok(CompatibilityReport {
            compatibility,
            recommended,
            analysis,
        })
    }

    pub fn get_agent_lineage(&self, id: &str) -> Result<LineageReport, SimError> {
        let entity = self.entity_of(id)?;
        let lineage = self
            .world()
            .get::<Lineage>(entity)
            .ok_or_else(|| SimError::UnknownEntity(id.to_string()))?;
        Ok(LineageReport {
            id: id.to_string(),
            parents: lineage.parents.clone(),
            children: lineage.children.clone(),
            is_founder: lineage.parents.is_empty(),
        })
    }

    /// Set one trait on a live agent, validating the [0, 1] bound.
    pub fn set_trait(
        &mut self,
        id: &str,
        domain: TraitDomain,
        key: &str,
        value: f64,
    ) -> Result<(), SimError> {
        if !(0.0..=1.0).contains(&value) || !value.is_finite() {
            return Err(SimError::InvalidTraitValue {
                key: key.to_string(),
                value,
            });
        }
        let entity = self.entity_of(id)?;
        let mut traits = self
            .world_mut()
            .get_mut::<TraitSet>(entity)
            .ok_or_else(|| SimError::UnknownEntity(id.to_string()))?;
        traits.domain_mut(domain).insert(key.to_string(), value);
        Ok(())
    }

    /// Component-wise copy of one agent's core state.
    pub fn agent_snapshot(&self, id: &str) -> Result<AgentSnapshot, SimError> {
        let entity = self.entity_of(id)?;
        persist::snapshot_agent(self.world(), entity)
            .ok_or_else(|| SimError::UnknownEntity(id.to_string()))
    }

    /// Persist the full simulation state to the configured directory.
    pub fn save_simulation_state(&self) -> Result<(), SimError> {
        let dir = self.world().resource::<SimConfig>().save_dir.clone();
        persist::save_world(self.world(), &dir)
    }

    /// Replace this simulation's entire state with the one saved in the
    /// configured directory. The world is rebuilt from scratch; entity ids
    /// are not preserved, agent ids and creation order are.
    pub fn load_simulation_state(&mut self) -> Result<(), SimError> {
        let config = self.world().resource::<SimConfig>().clone();
        let seed = self.world().resource::<SimRng>().seed;
        let (clock, agents) = persist::read_state(&config.save_dir)?;

        let mut app = build_sim_app_seeded(config, seed);
        persist::restore_world(app.world_mut(), clock, agents)?;
        self.app = app;
        let loaded = self.world().resource::<AgentIndex>().len();
        tracing::info!(agents = loaded, "simulation state loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn founder(name: &str, curiosity: f64) -> AgentSeed {
        AgentSeed {
            name: name.to_string(),
            spirit: "fox".to_string(),
            style: "wanderer".to_string(),
            personality: vec![("curiosity".to_string(), curiosity)],
            age: Some(25.0),
            ..AgentSeed::default()
        }
    }

    #[test]
    fn out_of_range_trait_is_rejected_before_spawn() {
        let mut sim = WorldSimulation::new(SimConfig::default());
        let mut seed = founder("bad", 0.5);
        seed.physical.push(("height".to_string(), 1.5));
        let err = sim.create_agent_with_inheritance("bad", seed).unwrap_err();
        assert!(matches!(err, SimError::InvalidTraitValue { ref key, .. } if key == "height"));
        assert_eq!(sim.get_simulation_status().total_agents, 0);
    }

    #[test]
    fn status_read_is_idempotent() {
        let mut sim = WorldSimulation::new(SimConfig::default());
        sim.create_agent_with_inheritance("a", founder("a", 0.5))
            .unwrap();
        sim.update_simulation(1.0);
        let first = sim.get_simulation_status();
        let second = sim.get_simulation_status();
        assert_eq!(first, second);
        assert_eq!(first.simulation_time, 1.0);
    }

    #[test]
    fn acceleration_scales_simulated_time() {
        let mut sim = WorldSimulation::new(SimConfig::default());
        sim.accelerate_time(10.0);
        sim.update_simulation(0.5);
        assert_eq!(sim.get_simulation_status().simulation_time, 5.0);
    }

    #[test]
    fn invalid_acceleration_is_ignored() {
        let mut sim = WorldSimulation::new(SimConfig::default());
        sim.accelerate_time(-3.0);
        sim.accelerate_time(f64::NAN);
        assert_eq!(sim.get_simulation_status().time_acceleration, 1.0);
    }

    #[test]
    fn nudge_ignores_acceleration() {
        let mut sim = WorldSimulation::new(SimConfig::default());
        sim.accelerate_time(100.0);
        sim.nudge_time(2.0);
        assert_eq!(sim.get_simulation_status().simulation_time, 2.0);
    }

    #[test]
    fn seed_traits_override_inherited_keys() {
        let mut sim = WorldSimulation::new(SimConfig::default());
        sim.create_agent_with_inheritance("p1", founder("p1", 1.0))
            .unwrap();
        sim.create_agent_with_inheritance("p2", founder("p2", 1.0))
            .unwrap();

        let mut child = AgentSeed {
            parents: Some(("p1".to_string(), "p2".to_string())),
            ..AgentSeed::default()
        };
        child.personality.push(("curiosity".to_string(), 0.25));
        sim.create_agent_with_inheritance("c", child).unwrap();

        let snapshot = sim.agent_snapshot("c").unwrap();
        assert_eq!(snapshot.traits.personality["curiosity"], 0.25);
        assert_eq!(snapshot.lineage.parents, vec!["p1", "p2"]);

        let p1 = sim.get_agent_lineage("p1").unwrap();
        assert_eq!(p1.children, vec!["c"]);
        assert!(p1.is_founder);
    }

    #[test]
    fn unknown_parent_fails_creation() {
        let mut sim = WorldSimulation::new(SimConfig::default());
        let seed = AgentSeed {
            parents: Some(("ghost".to_string(), "ghost2".to_string())),
            ..AgentSeed::default()
        };
        let err = sim.create_agent_with_inheritance("c", seed).unwrap_err();
        assert!(matches!(err, SimError::UnknownEntity(ref id) if id == "ghost"));
    }
}
