//! Synchronous planning on the caller's thread.

use patha_map::RoadMap;
use std::sync::Arc;

use super::{PendingPlan, PlanRequest, PlanService, PlannerConfig, plan_on_map};

/// Runs A* inside `submit`; the returned plan is ready on its first poll.
pub struct InlinePlanService {
    map: Arc<RoadMap>,
    config: PlannerConfig,
}

impl InlinePlanService {
    pub fn new(map: Arc<RoadMap>, config: PlannerConfig) -> Self {
        Self { map, config }
    }
}

impl PlanService for InlinePlanService {
    fn submit(&self, request: PlanRequest) -> PendingPlan {
        PendingPlan::ready(plan_on_map(&self.map, &self.config, &request))
    }

    fn name(&self) -> &'static str {
        "inline"
    }
}
