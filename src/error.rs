use thiserror::Error;

/// Errors surfaced by the public simulation operations.
///
/// Store-level errors (`DuplicateEntity`, `UnknownEntity`,
/// `InvalidTraitValue`) indicate caller mistakes and propagate unmodified.
/// Per-entity failures inside a tick are logged and skipped instead, so a
/// single bad agent never halts the rest of the population for that tick.
#[derive(Error, Debug)]
pub enum SimError {
    /// The agent id is already registered in the world.
    #[error("agent id already in use: {0}")]
    DuplicateEntity(String),

    /// The operation referenced an agent that does not exist, or that is
    /// missing a component the operation requires.
    #[error("unknown agent: {0}")]
    UnknownEntity(String),

    /// An externally supplied trait value fell outside [0.0, 1.0].
    /// Internal mutation always clamps; explicit sets must reject instead.
    #[error("trait {key:?} value {value} outside [0.0, 1.0]")]
    InvalidTraitValue { key: String, value: f64 },

    /// Reading or writing the save directory failed.
    #[error("persistence i/o failed")]
    Persistence(#[from] std::io::Error),

    /// A snapshot could not be encoded or decoded.
    #[error("snapshot encoding failed")]
    Snapshot(#[from] serde_json::Error),
}
