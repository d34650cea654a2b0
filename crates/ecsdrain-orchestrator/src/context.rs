//! Per-run logging context.
//!
//! Built once at invocation start from the lifecycle event and turned into
//! a `tracing` span that wraps the whole run, so every log line carries the
//! instance, autoscaling group and hook.

use tracing::{Span, info_span};

/// Identifies one drain invocation in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainContext {
    pub instance_id: String,
    pub auto_scaling_group: Option<String>,
    pub lifecycle_hook: Option<String>,
}

impl DrainContext {
    /// Context for a run started outside a lifecycle event.
    pub fn local(instance_id: &str) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            auto_scaling_group: None,
            lifecycle_hook: None,
        }
    }

    pub fn for_lifecycle(instance_id: &str, auto_scaling_group: &str, lifecycle_hook: &str) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            auto_scaling_group: Some(auto_scaling_group.to_string()),
            lifecycle_hook: Some(lifecycle_hook.to_string()),
        }
    }

    pub fn span(&self) -> Span {
        info_span!(
            "drain",
            host = %self.instance_id,
            asg = self.auto_scaling_group.as_deref().unwrap_or("-"),
            hook = self.lifecycle_hook.as_deref().unwrap_or("-"),
        )
    }
}
