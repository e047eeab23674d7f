use std::path::PathBuf;

use bevy_ecs::resource::Resource;

/// All simulation tunables in one place, supplied at `WorldSimulation`
/// construction and stored as a resource so systems read a single source
/// of truth.
///
/// Ages and durations are in simulated time units; probabilities are per
/// tick.
#[derive(Resource, Debug, Clone)]
pub struct SimConfig {
    /// Upper age bound (exclusive) of the infant stage.
    pub infant_max_age: f64,
    /// Upper age bound (exclusive) of the juvenile stage.
    pub juvenile_max_age: f64,
    /// Upper age bound (exclusive) of the adult stage; at or past it an
    /// agent is an elder.
    pub adult_max_age: f64,
    /// Maturity age stamped on newly created agents.
    pub default_maturity_age: f64,
    /// Maximum age stamped on newly created agents; reaching it removes
    /// the agent from the world.
    pub default_max_age: f64,
    /// Per-tick probability that an eligible agent attempts to breed.
    pub reproduction_chance: f64,
    /// Recovery period applied to both parents after breeding.
    pub reproduction_cooldown: f64,
    /// Offspring cap stamped on newly created agents.
    pub default_max_offspring: u32,
    /// Mutation deltas are drawn uniformly from [-bound, +bound].
    pub mutation_bound: f64,
    /// A delta counts as a mutation only when its magnitude exceeds this.
    pub mutation_epsilon: f64,
    /// Minimum compatibility score for a pairing to be viable.
    pub compatibility_threshold: f64,
    /// Directory that save/load round-trips go through.
    pub save_dir: PathBuf,
    /// Seed for the simulation RNG.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            infant_max_age: 5.0,
            juvenile_max_age: 18.0,
            adult_max_age: 60.0,
            default_maturity_age: 18.0,
            default_max_age: 100.0,
            reproduction_chance: 0.01,
            reproduction_cooldown: 10.0,
            default_max_offspring: 5,
            mutation_bound: 0.1,
            mutation_epsilon: 0.01,
            compatibility_threshold: 0.3,
            save_dir: PathBuf::from("state"),
            seed: 42,
        }
    }
}
