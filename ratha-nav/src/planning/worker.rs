//! Planning on a dedicated background thread.
//!
//! Requests travel over a crossbeam channel together with a one-shot reply
//! channel. The worker owns a shared handle to the immutable map and plans
//! one request at a time. Dropping the service closes the queue; the worker
//! drains what is left and exits.

use crossbeam_channel::{Sender, bounded, unbounded};
use patha_map::RoadMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::{PendingPlan, PlanOutcome, PlanRequest, PlanService, PlannerConfig, plan_on_map};
use crate::error::{PlanError, Result};

struct Job {
    request: PlanRequest,
    reply: Sender<PlanOutcome>,
}

/// Plans on a named background thread.
pub struct WorkerPlanService {
    jobs: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
    timeout_ticks: u32,
}

impl WorkerPlanService {
    /// Start the worker thread.
    pub fn spawn(map: Arc<RoadMap>, config: PlannerConfig, timeout_ticks: u32) -> Result<Self> {
        let (jobs_tx, jobs_rx) = unbounded::<Job>();

        let handle = thread::Builder::new()
            .name("planner".into())
            .spawn(move || {
                tracing::debug!("Planner worker started");
                for job in jobs_rx.iter() {
                    let outcome = plan_on_map(&map, &config, &job.request);
                    // Requester may have timed out and dropped its end
                    let _ = job.reply.send(outcome);
                }
                tracing::debug!("Planner worker exiting");
            })?;

        Ok(Self {
            jobs: Some(jobs_tx),
            handle: Some(handle),
            timeout_ticks,
        })
    }
}

impl PlanService for WorkerPlanService {
    fn submit(&self, request: PlanRequest) -> PendingPlan {
        let (reply_tx, reply_rx) = bounded(1);
        let job = Job {
            request,
            reply: reply_tx,
        };

        let queued = self.jobs.as_ref().map(|jobs| jobs.send(job));
        match queued {
            Some(Ok(())) => PendingPlan::new(reply_rx, self.timeout_ticks),
            _ => PendingPlan::ready(Err(PlanError::WorkerGone)),
        }
    }

    fn name(&self) -> &'static str {
        "worker"
    }
}

impl Drop for WorkerPlanService {
    fn drop(&mut self) {
        drop(self.jobs.take());
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!("Planner worker panicked");
        }
    }
}
