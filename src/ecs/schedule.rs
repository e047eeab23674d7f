use bevy_ecs::schedule::{ExecutorKind, IntoScheduleConfigs, Schedule, ScheduleLabel, SystemSet};

/// Schedule label for one simulation tick.
/// Run manually per tick via `app.world_mut().run_schedule(SimTick)`.
#[derive(ScheduleLabel, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimTick;

/// Ordered phases within each tick: PreUpdate < Update < PostUpdate < Last.
/// Message rotation runs in PreUpdate; the command applicator (deferred
/// despawns and births) runs in PostUpdate.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimPhase {
    PreUpdate,
    Update,
    PostUpdate,
    Last,
}

/// Domain sets within `SimPhase::Update`. Lifecycle always precedes
/// Reproduction so stage transitions from this tick are visible to
/// breeding eligibility in the same tick.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DomainSet {
    Lifecycle,
    Reproduction,
}

/// Build a configured `SimTick` schedule with phase and domain ordering.
///
/// Single-threaded executor: the engine is cooperative and deterministic;
/// RNG consumption order must be identical across runs with the same seed.
pub fn configure_sim_schedule() -> Schedule {
    let mut schedule = Schedule::new(SimTick);
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.configure_sets(
        (
            SimPhase::PreUpdate,
            SimPhase::Update,
            SimPhase::PostUpdate,
            SimPhase::Last,
        )
            .chain(),
    );
    schedule.configure_sets(DomainSet::Lifecycle.in_set(SimPhase::Update));
    schedule.configure_sets(DomainSet::Reproduction.in_set(SimPhase::Update));
    schedule.configure_sets(DomainSet::Reproduction.after(DomainSet::Lifecycle));
    schedule
}
