//! Error types for RathaNav

use patha_map::{MapError, PathNotFound};
use thiserror::Error;

/// Startup failure. Nothing here is raised once the race loop is running.
#[derive(Error, Debug)]
pub enum NavError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NavError>;

/// Why a plan request produced no path.
///
/// Every variant is recoverable; the requesting agent keeps its last path.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum PlanError {
    #[error("no path: {0}")]
    NotFound(#[from] PathNotFound),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("planner rejected request: {0}")]
    Rejected(String),

    #[error("no response after {ticks} ticks")]
    Timeout { ticks: u32 },

    #[error("planner worker is gone")]
    WorkerGone,
}

impl PlanError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PlanError::Timeout { .. })
    }
}
