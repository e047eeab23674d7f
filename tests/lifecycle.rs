//! End-to-end ageing behavior driven through the public facade.

use progeny::{AgentSeed, LifeStage, SimConfig, SimError, WorldSimulation};

fn founder(name: &str, age: f64) -> AgentSeed {
    AgentSeed {
        name: name.to_string(),
        spirit: "fox".to_string(),
        style: "wanderer".to_string(),
        personality: vec![("curiosity".to_string(), 0.5)],
        age: Some(age),
        ..AgentSeed::default()
    }
}

fn stage_of(sim: &WorldSimulation, id: &str) -> LifeStage {
    sim.agent_snapshot(id).unwrap().lifecycle.stage
}

#[test]
fn agent_walks_through_every_life_stage() {
    let mut sim = WorldSimulation::new(SimConfig::default());
    sim.create_agent_with_inheritance("a", founder("a", 0.0))
        .unwrap();
    assert_eq!(stage_of(&sim, "a"), LifeStage::Infant);

    sim.nudge_time(4.0);
    assert_eq!(stage_of(&sim, "a"), LifeStage::Infant);

    sim.nudge_time(2.0); // age 6
    assert_eq!(stage_of(&sim, "a"), LifeStage::Juvenile);

    sim.nudge_time(14.0); // age 20
    assert_eq!(stage_of(&sim, "a"), LifeStage::Adult);

    sim.nudge_time(45.0); // age 65
    assert_eq!(stage_of(&sim, "a"), LifeStage::Elder);
}

#[test]
fn stages_never_regress_under_small_ticks() {
    let mut sim = WorldSimulation::new(SimConfig::default());
    sim.create_agent_with_inheritance("a", founder("a", 0.0))
        .unwrap();

    let mut last = stage_of(&sim, "a");
    for _ in 0..120 {
        sim.update_simulation(0.75);
        if sim.agent_snapshot("a").is_err() {
            break; // reached max age
        }
        let stage = stage_of(&sim, "a");
        assert!(stage >= last, "stage regressed from {last:?} to {stage:?}");
        last = stage;
    }
}

#[test]
fn reaching_max_age_removes_the_agent() {
    let mut sim = WorldSimulation::new(SimConfig::default());
    let mut seed = founder("brief", 0.0);
    seed.max_age = Some(3.0);
    sim.create_agent_with_inheritance("brief", seed).unwrap();

    sim.nudge_time(2.5);
    assert_eq!(sim.get_simulation_status().total_agents, 1);

    sim.nudge_time(1.0); // age 3.5 >= max_age 3
    assert_eq!(sim.get_simulation_status().total_agents, 0);
    let err = sim.agent_snapshot("brief").unwrap_err();
    assert!(matches!(err, SimError::UnknownEntity(_)));
}

#[test]
fn large_accelerated_jump_applies_deaths_in_one_pass() {
    let mut sim = WorldSimulation::new(SimConfig::default());
    sim.create_agent_with_inheritance("old", founder("old", 95.0))
        .unwrap();
    sim.create_agent_with_inheritance("young", founder("young", 20.0))
        .unwrap();

    sim.accelerate_time(50.0);
    sim.update_simulation(0.2); // 10 simulated units

    assert!(sim.agent_snapshot("old").is_err());
    let young = sim.agent_snapshot("young").unwrap();
    assert_eq!(young.lifecycle.age, 30.0);
    assert_eq!(sim.get_simulation_status().simulation_time, 10.0);
}
