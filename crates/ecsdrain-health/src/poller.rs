//! Bounded health polling.
//!
//! Repeats [`check_once`] until an attempt reports every endpoint clear,
//! sleeping a fixed interval between attempts.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use ecsdrain_plane::{LoadBalancerDirectory, PlaneResult, TargetGroupDirectory};

use crate::checker::check_once;

/// Attempt budget and pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval: Duration::from_secs(5),
        }
    }
}

/// Final result of a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollOutcome {
    /// Whether the last attempt found every endpoint clear.
    pub drained: bool,
    /// Attempts actually made.
    pub attempts: u32,
}

/// Polls endpoint health for one instance.
pub struct HealthPoller<'a, P> {
    plane: &'a P,
    config: PollConfig,
}

impl<'a, P> HealthPoller<'a, P>
where
    P: LoadBalancerDirectory + TargetGroupDirectory,
{
    pub fn new(plane: &'a P, config: PollConfig) -> Self {
        Self { plane, config }
    }

    /// Wait until `instance_id` is out of every endpoint, or the budget runs out.
    ///
    /// Stops on the first complete attempt. A budget of zero still makes
    /// one attempt. Control-plane errors abort the poll; unfinished
    /// draining does not.
    pub async fn await_drained(
        &self,
        instance_id: &str,
        load_balancers: &[String],
        target_groups: &[String],
    ) -> PlaneResult<PollOutcome> {
        let budget = self.config.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let report = check_once(self.plane, instance_id, load_balancers, target_groups).await?;

            if report.is_complete() {
                info!(instance = %instance_id, attempts, "instance removed from all endpoints");
                return Ok(PollOutcome {
                    drained: true,
                    attempts,
                });
            }

            let pending: Vec<String> = report
                .pending()
                .iter()
                .map(|e| format!("{}={}", e.endpoint, e.state))
                .collect();

            if attempts >= budget {
                warn!(
                    instance = %instance_id,
                    attempts,
                    ?pending,
                    "instance still attached to endpoints after final attempt"
                );
                return Ok(PollOutcome {
                    drained: false,
                    attempts,
                });
            }

            debug!(
                instance = %instance_id,
                attempt = attempts,
                budget,
                ?pending,
                retry_in_secs = self.config.interval.as_secs(),
                "instance still attached to endpoints"
            );
            tokio::time::sleep(self.config.interval).await;
        }
    }
}
