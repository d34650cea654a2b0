//! Lifecycle handler error types.

use thiserror::Error;

use ecsdrain_orchestrator::DrainError;
use ecsdrain_plane::PlaneError;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to decode lifecycle event: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("lifecycle event envelope has no records")]
    EmptyEnvelope,

    #[error("lifecycle message is missing {0}")]
    MissingField(&'static str),

    #[error("drain failed: {0}")]
    Drain(#[from] DrainError),

    #[error("failed to complete lifecycle action: {0}")]
    Signal(#[source] PlaneError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
