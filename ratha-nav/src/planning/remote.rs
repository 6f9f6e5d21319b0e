//! Planning through an HTTP planner service.
//!
//! Each request is POSTed as JSON from a short-lived thread so the
//! simulation never blocks on the network. Transport errors, non-2xx
//! statuses, undecodable bodies, error replies and empty paths all resolve
//! to a [`PlanError`], which agents treat exactly like a failed local plan.
//!
//! Wire format:
//!
//! ```text
//! request:  {"start": {"x": 10, "y": 20}, "goal": {"x": 60, "y": 20}, "radius": 160}
//! response: {"path": [{"x": 10, "y": 20}, ...]}  |  {"error": "not_found"}
//! ```

use crossbeam_channel::bounded;
use patha_map::{PathNotFound, WorldPoint};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

use super::{PendingPlan, PlanOutcome, PlanRequest, PlanService};
use crate::error::{PlanError, Result};

/// Remote planner endpoint settings.
#[derive(Clone, Debug, Deserialize)]
pub struct RemoteConfig {
    /// URL the request is POSTed to
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// HTTP timeout per request (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8000/path".to_string()
}
fn default_timeout_ms() -> u64 {
    2000
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// JSON request body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WirePlanRequest {
    pub start: WorldPoint,
    pub goal: WorldPoint,
    #[serde(default, alias = "radius_px", skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
}

impl From<&PlanRequest> for WirePlanRequest {
    fn from(request: &PlanRequest) -> Self {
        Self {
            start: request.start,
            goal: request.goal,
            radius: request.radius,
        }
    }
}

/// JSON response body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WirePlanResponse {
    Path { path: Vec<WorldPoint> },
    Error { error: String },
}

impl WirePlanResponse {
    pub fn into_outcome(self) -> PlanOutcome {
        match self {
            WirePlanResponse::Path { path } if path.is_empty() => {
                Err(PlanError::Rejected("empty path".into()))
            }
            WirePlanResponse::Path { path } => Ok(path),
            WirePlanResponse::Error { error } if error == "not_found" => {
                Err(PlanError::NotFound(PathNotFound::NoPath))
            }
            WirePlanResponse::Error { error } => Err(PlanError::Rejected(error)),
        }
    }
}

/// Plans by POSTing to a remote planner.
pub struct RemotePlanService {
    client: reqwest::blocking::Client,
    endpoint: String,
    timeout_ticks: u32,
}

impl RemotePlanService {
    pub fn new(config: &RemoteConfig, timeout_ticks: u32) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                crate::error::NavError::Config(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            timeout_ticks,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// One blocking round trip
fn post_request(
    client: &reqwest::blocking::Client,
    endpoint: &str,
    body: &WirePlanRequest,
) -> PlanOutcome {
    let response = client
        .post(endpoint)
        .json(body)
        .send()
        .map_err(|e| PlanError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PlanError::Transport(format!("HTTP {}", status)));
    }

    response
        .json::<WirePlanResponse>()
        .map_err(|e| PlanError::Transport(format!("bad response body: {}", e)))?
        .into_outcome()
}

impl PlanService for RemotePlanService {
    fn submit(&self, request: PlanRequest) -> PendingPlan {
        let (reply_tx, reply_rx) = bounded(1);
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let body = WirePlanRequest::from(&request);

        let spawned = thread::Builder::new()
            .name("remote-plan".into())
            .spawn(move || {
                let outcome = post_request(&client, &endpoint, &body);
                if let Err(e) = &outcome {
                    tracing::debug!("Remote plan failed: {}", e);
                }
                let _ = reply_tx.send(outcome);
            });

        match spawned {
            Ok(_) => PendingPlan::new(reply_rx, self.timeout_ticks),
            Err(e) => PendingPlan::ready(Err(PlanError::Transport(format!(
                "failed to spawn request thread: {}",
                e
            )))),
        }
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
