//! Error types for control-plane calls.

use thiserror::Error;

/// Result type alias for control-plane operations.
pub type PlaneResult<T> = Result<T, PlaneError>;

/// Errors a control-plane call can surface to the drain core.
///
/// None of these are retried by the core: every variant is a
/// control-plane failure and is fatal to the run.
#[derive(Debug, Error)]
pub enum PlaneError {
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },

    #[error("malformed {operation} response: {message}")]
    Malformed {
        operation: &'static str,
        message: String,
    },

    #[error("failed to load inventory: {0}")]
    Inventory(String),
}

impl PlaneError {
    /// Name of the control-plane operation that failed, if any.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Api { operation, .. } | Self::Malformed { operation, .. } => Some(operation),
            Self::Inventory(_) => None,
        }
    }
}
