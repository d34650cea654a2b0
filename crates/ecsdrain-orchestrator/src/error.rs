//! Drain error types.

use thiserror::Error;

use ecsdrain_plane::PlaneError;

/// Errors that abort a drain run.
///
/// Instances missing from every cluster and instances without tasks are
/// not errors; they surface as [`crate::DrainOutcome`] variants.
#[derive(Debug, Error)]
pub enum DrainError {
    #[error("control plane error: {0}")]
    Plane(#[from] PlaneError),

    #[error("failed to deregister container instance {container_instance} from {cluster}: {source}")]
    Deregister {
        cluster: String,
        container_instance: String,
        source: PlaneError,
    },
}

pub type DrainResult<T> = Result<T, DrainError>;
