use std::collections::BTreeMap;

use bevy_ecs::component::Component;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::error::SimError;

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

/// Marks an entity managed by the core engine. Peer subsystems attach their
/// own component types to the same entities; the core only ever queries its
/// own.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Agent;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Immutable identity metadata. The id is duplicated in `AgentIndex` for
/// reverse lookup; both are written once at spawn.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCore {
    pub id: String,
    pub name: String,
    pub spirit: String,
    pub style: String,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// The three trait domains an agent carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitDomain {
    Personality,
    Physical,
    Abilities,
}

/// Heritable trait maps. Every value is held in [0.0, 1.0] at all times:
/// inheritance clamps, external sets reject.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraitSet {
    pub personality: BTreeMap<String, f64>,
    pub physical: BTreeMap<String, f64>,
    pub abilities: BTreeMap<String, f64>,
    /// How many trait keys actually mutated at this agent's creation.
    /// Monotonically non-decreasing.
    pub mutation_count: u32,
}

impl TraitSet {
    pub fn domain(&self, domain: TraitDomain) -> &BTreeMap<String, f64> {
        match domain {
            TraitDomain::Personality => &self.personality,
            TraitDomain::Physical => &self.physical,
            TraitDomain::Abilities => &self.abilities,
        }
    }

    pub fn domain_mut(&mut self, domain: TraitDomain) -> &mut BTreeMap<String, f64> {
        match domain {
            TraitDomain::Personality => &mut self.personality,
            TraitDomain::Physical => &mut self.physical,
            TraitDomain::Abilities => &mut self.abilities,
        }
    }

    /// Reject any externally supplied value outside [0.0, 1.0].
    pub fn validate(&self) -> Result<(), SimError> {
        for map in [&self.personality, &self.physical, &self.abilities] {
            for (key, &value) in map {
                if !(0.0..=1.0).contains(&value) {
                    return Err(SimError::InvalidTraitValue {
                        key: key.clone(),
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Life stage, a pure function of age. Ordering follows age, so stage
/// comparisons read naturally (`stage >= LifeStage::Adult`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    Infant,
    Juvenile,
    Adult,
    Elder,
}

impl LifeStage {
    /// Derive the stage from an age via the configured thresholds.
    /// Monotonic in age by construction.
    pub fn from_age(age: f64, config: &SimConfig) -> Self {
        if age < config.infant_max_age {
            LifeStage::Infant
        } else if age < config.juvenile_max_age {
            LifeStage::Juvenile
        } else if age < config.adult_max_age {
            LifeStage::Adult
        } else {
            LifeStage::Elder
        }
    }
}

/// Ageing state. `stage` is recomputed from `age` every tick; an agent
/// reaching `max_age` is removed from the world at the end of that tick.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub age: f64,
    pub stage: LifeStage,
    pub maturity_age: f64,
    pub max_age: f64,
}

impl Lifecycle {
    /// A fresh newborn (age 0, infant) with configured defaults.
    pub fn newborn(config: &SimConfig) -> Self {
        Self::at_age(0.0, config)
    }

    /// An agent seeded at a specific age, stage derived from it.
    pub fn at_age(age: f64, config: &SimConfig) -> Self {
        Self {
            age,
            stage: LifeStage::from_age(age, config),
            maturity_age: config.default_maturity_age,
            max_age: config.default_max_age,
        }
    }

    pub fn is_adult(&self) -> bool {
        self.stage == LifeStage::Adult
    }
}

// ---------------------------------------------------------------------------
// Reproduction
// ---------------------------------------------------------------------------

/// Breeding state. Eligibility is derived, never stored: adult stage,
/// cooldown elapsed, under the offspring cap.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reproduction {
    pub cooldown: f64,
    pub offspring_count: u32,
    pub max_offspring: u32,
}

impl Reproduction {
    /// Fresh state for a newly created agent: no cooldown, no offspring.
    pub fn fresh(config: &SimConfig) -> Self {
        Self {
            cooldown: 0.0,
            offspring_count: 0,
            max_offspring: config.default_max_offspring,
        }
    }

    pub fn can_reproduce(&self, lifecycle: &Lifecycle) -> bool {
        lifecycle.is_adult()
            && self.cooldown <= 0.0
            && self.offspring_count < self.max_offspring
    }
}

// ---------------------------------------------------------------------------
// Lineage
// ---------------------------------------------------------------------------

/// Parent/child links forming a DAG across generations. Parents are fixed
/// at creation (at most two, in order); children is append-only.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lineage {
    pub parents: Vec<String>,
    pub children: Vec<String>,
}

impl Lineage {
    /// A root agent with no recorded ancestry.
    pub fn root() -> Self {
        Self::default()
    }

    /// An offspring of the two given parents, in order.
    pub fn of(parent_a: &str, parent_b: &str) -> Self {
        Self {
            parents: vec![parent_a.to_string(), parent_b.to_string()],
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_from_age_follows_thresholds() {
        let cfg = SimConfig::default();
        assert_eq!(LifeStage::from_age(0.0, &cfg), LifeStage::Infant);
        assert_eq!(LifeStage::from_age(4.9, &cfg), LifeStage::Infant);
        assert_eq!(LifeStage::from_age(5.0, &cfg), LifeStage::Juvenile);
        assert_eq!(LifeStage::from_age(17.9, &cfg), LifeStage::Juvenile);
        assert_eq!(LifeStage::from_age(18.0, &cfg), LifeStage::Adult);
        assert_eq!(LifeStage::from_age(59.9, &cfg), LifeStage::Adult);
        assert_eq!(LifeStage::from_age(60.0, &cfg), LifeStage::Elder);
        assert_eq!(LifeStage::from_age(500.0, &cfg), LifeStage::Elder);
    }

    #[test]
    fn stage_is_monotonic_in_age() {
        let cfg = SimConfig::default();
        let mut previous = LifeStage::Infant;
        for tenth in 0..1000 {
            let stage = LifeStage::from_age(tenth as f64 / 10.0, &cfg);
            assert!(stage >= previous, "stage regressed at age {}", tenth as f64 / 10.0);
            previous = stage;
        }
    }

    #[test]
    fn validate_accepts_unit_interval() {
        let mut traits = TraitSet::default();
        traits.personality.insert("curiosity".into(), 0.0);
        traits.physical.insert("stamina".into(), 1.0);
        traits.abilities.insert("foraging".into(), 0.5);
        assert!(traits.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let mut traits = TraitSet::default();
        traits.personality.insert("curiosity".into(), 1.2);
        let err = traits.validate().unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidTraitValue { ref key, value } if key == "curiosity" && value == 1.2
        ));
    }

    #[test]
    fn can_reproduce_requires_adult_cooldown_and_cap() {
        let cfg = SimConfig::default();
        let adult = Lifecycle::at_age(25.0, &cfg);
        let infant = Lifecycle::at_age(1.0, &cfg);
        let mut rep = Reproduction::fresh(&cfg);

        assert!(rep.can_reproduce(&adult));
        assert!(!rep.can_reproduce(&infant));

        rep.cooldown = 3.0;
        assert!(!rep.can_reproduce(&adult));

        rep.cooldown = 0.0;
        rep.offspring_count = rep.max_offspring;
        assert!(!rep.can_reproduce(&adult));
    }

    #[test]
    fn lineage_of_records_parent_order() {
        let lineage = Lineage::of("adam", "eve");
        assert_eq!(lineage.parents, vec!["adam", "eve"]);
        assert!(lineage.children.is_empty());
    }
}
