//! Error types.

use thiserror::Error;

/// Errors that can occur while building or solving a game.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("tenant {tenant}: SLA of web service {service} of application {app} can't be met")]
    InfeasibleSla { tenant: usize, app: usize, service: usize },

    #[error("tenant {tenant}: application {app} is saturated (throughput {throughput} >= capacity {capacity})")]
    Saturated {
        tenant: usize,
        app: usize,
        throughput: f64,
        capacity: f64,
    },

    #[error("insufficient resources: {demand} VMs requested, {capacity} available")]
    InsufficientResources { demand: f64, capacity: u32 },

    #[error("worker {rank}: protocol error: {reason}")]
    Protocol { rank: usize, reason: String },

    #[error("worker {rank}: peer {peer} disconnected")]
    Disconnected { rank: usize, peer: usize },

    #[error("worker {rank}: run aborted by coordinator")]
    Aborted { rank: usize },

    #[error("worker {rank} panicked")]
    WorkerPanicked { rank: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GameError {
    /// Returns true for errors which only echo a failure that happened elsewhere in the run.
    pub fn is_secondary(&self) -> bool {
        matches!(self, GameError::Disconnected { .. } | GameError::Aborted { .. })
    }
}

pub type GameResult<T> = Result<T, GameError>;
