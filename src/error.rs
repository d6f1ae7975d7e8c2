use thiserror::Error;

use crate::{AgentId, DetectionId};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Insufficient history: at least 2 observations required, got {0}")]
    InsufficientHistory(usize),

    #[error("Dataset `{0}` has no qualifying windows")]
    EmptyDataset(String),

    #[error("No dataset in this run has qualifying windows")]
    EmptyRun,

    #[error("Agent {agent}: timestamp {timestamp} does not follow {last}")]
    NonMonotonicTimestamp {
        agent: AgentId,
        timestamp: f32,
        last: f32,
    },

    #[error("Agent {agent}: expected detection {expected}, got {got}")]
    DetectionGap {
        agent: AgentId,
        expected: DetectionId,
        got: DetectionId,
    },

    #[error("Agent {agent}: window at detection {detection_id} has no valid future steps")]
    NoValidFuture {
        agent: AgentId,
        detection_id: DetectionId,
    },

    #[error("No hypotheses to score")]
    NoHypotheses,

    #[error("Hypothesis covers {got} steps, prediction horizon is {expected}")]
    HorizonMismatch { expected: usize, got: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Evaluation aborted")]
    Aborted,

    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    JsonError(#[from] serde_json::Error),
}
