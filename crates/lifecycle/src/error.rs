//! Error types for the readiness gates and the lifecycle host

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LifecycleError>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Unknown ready state: {0}")]
    UnknownReadyState(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Listener dropped before the milestone was reached")]
    Closed,
}
