//! Shared fixtures for ratha-nav integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use ratha_nav::{
    Agent, AgentPose, PlanService, PlannerDriver, Race, RathaConfig, Track, TrackConfig,
};

/// The synthetic 800x600 oval, rasterized at 4 px cells.
pub fn oval_track() -> Track {
    Track::load(&TrackConfig::default()).unwrap()
}

pub fn planner_agent(
    name: &str,
    pose: AgentPose,
    track: &Track,
    config: &RathaConfig,
    service: Arc<dyn PlanService>,
) -> Agent {
    let driver = PlannerDriver::new(
        service,
        Arc::clone(&track.centerline),
        config.follower.clone(),
        config.replan.clone(),
        config.planner.search_radius,
    );
    Agent::new(name, pose, Box::new(driver))
}

/// A race with a single planner-driven agent at `pose`.
pub fn solo_race(
    track: &Track,
    config: &RathaConfig,
    service: Arc<dyn PlanService>,
    pose: AgentPose,
) -> Race {
    let mut race = Race::new(Arc::clone(&track.map));
    race.add_agent(planner_agent("solo", pose, track, config, service));
    race
}
