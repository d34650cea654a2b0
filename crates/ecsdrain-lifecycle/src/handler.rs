//! Lifecycle handler: drain, then let the autoscaling group continue.

use serde::Serialize;
use tracing::{Instrument, error, info};

use ecsdrain_orchestrator::{DrainConfig, DrainOrchestrator, DrainOutcome};
use ecsdrain_plane::{
    ClusterDirectory, LifecycleActionResult, LifecycleSignaler, LoadBalancerDirectory,
    TargetGroupDirectory,
};

use crate::error::{LifecycleError, LifecycleResult};
use crate::event::{LifecycleEvent, TerminationNotice, decode};

/// What the handler did with an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HandlerOutcome {
    TestNotification,
    Skipped { transition: String },
    Drained {
        instance_id: String,
        drain: DrainOutcome,
        lifecycle_completed: bool,
    },
}

/// Handles lifecycle events against one control plane.
pub struct LifecycleHandler<'a, P> {
    plane: &'a P,
    config: DrainConfig,
}

impl<'a, P> LifecycleHandler<'a, P>
where
    P: ClusterDirectory + LoadBalancerDirectory + TargetGroupDirectory + LifecycleSignaler,
{
    pub fn new(plane: &'a P, config: DrainConfig) -> Self {
        Self { plane, config }
    }

    /// Decode a raw event payload and handle it.
    pub async fn handle(&self, raw: &str) -> LifecycleResult<HandlerOutcome> {
        let event = decode(raw)?;
        self.handle_event(event).await
    }

    pub async fn handle_event(&self, event: LifecycleEvent) -> LifecycleResult<HandlerOutcome> {
        match event {
            LifecycleEvent::Test => {
                info!("received lifecycle test notification");
                Ok(HandlerOutcome::TestNotification)
            }
            LifecycleEvent::Other { transition } => {
                info!(%transition, "ignoring lifecycle transition");
                Ok(HandlerOutcome::Skipped { transition })
            }
            LifecycleEvent::Terminating(notice) => self.drain(notice).await,
        }
    }

    async fn drain(&self, notice: TerminationNotice) -> LifecycleResult<HandlerOutcome> {
        let ctx = notice.context();
        info!(
            instance = %notice.instance_id,
            asg = %notice.auto_scaling_group,
            hook = %notice.lifecycle_hook,
            "received termination lifecycle event"
        );

        // A failed drain leaves the action pending; the hook timeout decides.
        let drain = DrainOrchestrator::new(self.plane, self.config.clone())
            .run(&ctx)
            .await
            .inspect_err(|e| error!(instance = %notice.instance_id, error = %e, "drain failed"))?;

        let lifecycle_completed = self.complete(&notice).instrument(ctx.span()).await?;

        Ok(HandlerOutcome::Drained {
            instance_id: notice.instance_id,
            drain,
            lifecycle_completed,
        })
    }

    async fn complete(&self, notice: &TerminationNotice) -> LifecycleResult<bool> {
        if self.config.dry_run {
            info!("dry run: not completing lifecycle action");
            return Ok(false);
        }

        info!("completing autoscaling action");
        self.plane
            .complete_lifecycle_action(&notice.action(LifecycleActionResult::Continue))
            .await
            .map_err(LifecycleError::Signal)?;
        Ok(true)
    }
}
