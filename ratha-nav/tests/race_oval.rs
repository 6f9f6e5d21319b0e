//! Full races on the synthetic oval track.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use ratha_nav::{
    AgentPose, InlinePlanService, PlannerMode, RathaConfig, WorkerPlanService, build_race,
    plan_service,
};

#[test]
fn test_planner_agents_lap_without_leaving_the_road() {
    let track = common::oval_track();
    let config = RathaConfig::default();
    let service = plan_service(&config, Arc::clone(&track.map)).unwrap();
    let (mut race, input) = build_race(&config, &track, service);
    assert!(input.is_none());
    assert_eq!(race.agents().len(), 3);

    let summary = race.run(1500);

    assert_eq!(summary.ticks, 1500);
    for agent in &summary.agents {
        // Most of a lap: the centerline is roughly 1900 units around
        assert!(
            agent.stats.distance > 2000.0,
            "{} only covered {:.0}",
            agent.name,
            agent.stats.distance
        );
        assert!(
            agent.off_road_fraction() < 0.02,
            "{} off road {:.1}% of the time",
            agent.name,
            agent.off_road_fraction() * 100.0
        );
        assert!(track.map.is_drivable_world(agent.pose.position()));

        let plans = agent.plans.expect("planner agents report plan stats");
        assert!(plans.requested >= 2);
        assert!(plans.succeeded >= 1);
        assert_eq!(plans.timed_out, 0);
    }
}

#[test]
fn test_agents_never_exceed_max_speed() {
    let track = common::oval_track();
    let config = RathaConfig::default();
    let service = Arc::new(InlinePlanService::new(
        Arc::clone(&track.map),
        config.planner.clone(),
    ));
    let (mut race, _) = build_race(&config, &track, service);

    for _ in 0..400 {
        race.step();
        for agent in race.agents() {
            assert!(agent.pose().speed <= config.follower.max_speed + 1e-4);
            assert!(agent.pose().heading > -std::f32::consts::PI - 1e-4);
            assert!(agent.pose().heading <= std::f32::consts::PI + 1e-4);
        }
    }
}

#[test]
fn test_agent_recovers_from_off_road_spawn() {
    let track = common::oval_track();
    let config = RathaConfig::default();

    // Infield, infield centre, and both outer corners
    let spawns = [
        AgentPose::new(400.0, 200.0, 0.0),
        AgentPose::new(400.0, 300.0, 3.0),
        AgentPose::new(20.0, 20.0, 1.0),
        AgentPose::new(780.0, 580.0, -2.0),
    ];

    for spawn in spawns {
        assert!(!track.map.is_drivable_world(spawn.position()));
        let service = Arc::new(InlinePlanService::new(
            Arc::clone(&track.map),
            config.planner.clone(),
        ));
        let mut race = common::solo_race(&track, &config, service, spawn);

        let summary = race.run(1200);
        let agent = &summary.agents[0];

        assert!(
            agent.stats.off_road_ticks < 200,
            "spawn at {} stayed off road for {} ticks",
            spawn,
            agent.stats.off_road_ticks
        );
        assert!(track.map.is_drivable_world(agent.pose.position()));
        assert!(agent.stats.distance > 1500.0);
    }
}

#[test]
fn test_worker_service_plans_for_a_live_race() {
    let track = common::oval_track();
    let mut config = RathaConfig::default();
    config.planner.mode = PlannerMode::Worker;
    config.simulation.ai_agents = 2;
    // Ticks run much faster than wall time here
    config.replan.plan_timeout_ticks = 1_000_000;

    let service = Arc::new(
        WorkerPlanService::spawn(
            Arc::clone(&track.map),
            config.planner.clone(),
            config.replan.plan_timeout_ticks,
        )
        .unwrap(),
    );
    let (mut race, _) = build_race(&config, &track, service);

    let deadline = Instant::now() + Duration::from_secs(10);
    let all_planned = |race: &ratha_nav::Race| {
        race.agents()
            .iter()
            .all(|a| a.plan_stats().is_some_and(|p| p.succeeded >= 1))
    };
    while !all_planned(&race) && Instant::now() < deadline {
        race.step();
        std::thread::sleep(Duration::from_micros(200));
    }

    assert!(all_planned(&race), "worker never delivered a plan");
    for agent in race.agents() {
        let plans = agent.plan_stats().unwrap();
        assert_eq!(plans.failed, 0);
        assert_eq!(plans.timed_out, 0);
        assert!(agent.stats().distance > 0.0);
    }
}

#[test]
fn test_manual_agent_joins_behind_planners() {
    let track = common::oval_track();
    let mut config = RathaConfig::default();
    config.simulation.ai_agents = 2;
    config.simulation.manual_agent = true;
    let service = plan_service(&config, Arc::clone(&track.map)).unwrap();

    let (mut race, input) = build_race(&config, &track, service);
    let input = input.expect("manual agent gets an input handle");

    assert_eq!(race.agents().len(), 3);
    assert_eq!(race.agents()[2].name(), "player");
    assert!(race.agents()[2].plan_stats().is_none());

    // Idle player stays put
    race.run(10);
    assert_eq!(race.agents()[2].stats().distance, 0.0);

    input.set_throttle(true);
    race.run(20);
    assert!(race.agents()[2].stats().distance > 0.0);
    assert!(race.agents()[2].pose().speed > 0.0);
}
