use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::Decision;

/// Failure reported by the order execution collaborator
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutionError {
    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("order not filled")]
    NotFilled,

    #[error("connectivity lost: {0}")]
    Connectivity(String),
}

/// Per-bar failures surfaced by the engine. None of them are fatal: the next
/// sample is processed normally.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid price {0}: must be finite and positive")]
    InvalidPrice(f64),

    #[error("sample at {got} is older than previous sample at {last}")]
    OutOfOrder {
        last: DateTime<Utc>,
        got: DateTime<Utc>,
    },

    #[error("execution failed for {:?}: {source}", .decision.action)]
    Execution {
        decision: Decision,
        #[source]
        source: ExecutionError,
    },

    #[error("cannot reset session while {0} position is open")]
    SessionBusy(&'static str),
}
