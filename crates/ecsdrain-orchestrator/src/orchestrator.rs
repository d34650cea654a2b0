//! The single-instance drain run.
//!
//! Linear with two early exits: an instance that is in no cluster, and a
//! container instance with no running tasks, both end the run successfully
//! without touching anything. Dry-run mode skips deregistration and the
//! drain wait but still performs discovery and the health poll.

use std::time::Duration;

use serde::Serialize;
use tracing::{Instrument, info, warn};

use ecsdrain_health::{HealthPoller, PollOutcome};
use ecsdrain_plane::{ClusterDirectory, LoadBalancerDirectory, ServiceId, TargetGroupDirectory, TaskId};

use crate::config::DrainConfig;
use crate::context::DrainContext;
use crate::deregister::deregister;
use crate::endpoints::Endpoints;
use crate::error::DrainResult;
use crate::timing::max_drain_timeout;
use crate::topology::{Placement, locate};
use crate::workload::{services_for, tasks_on};

/// Everything a completed run discovered and did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrainRun {
    pub instance_id: String,
    #[serde(flatten)]
    pub placement: Placement,
    pub tasks: Vec<TaskId>,
    pub services: Vec<ServiceId>,
    #[serde(flatten)]
    pub endpoints: Endpoints,
    pub timeout_secs: u64,
    pub deregistered: bool,
    pub poll: PollOutcome,
}

impl DrainRun {
    /// Whether the instance was confirmed gone from every endpoint.
    pub fn drained(&self) -> bool {
        self.poll.drained
    }
}

/// How a run ended. Every variant is a successful termination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DrainOutcome {
    /// No cluster knows the instance.
    NotInCluster,
    /// The container instance runs nothing, so there is nothing to drain.
    NoTasks(Placement),
    Completed(DrainRun),
}

/// Drains one instance against a control plane.
pub struct DrainOrchestrator<'a, P> {
    plane: &'a P,
    config: DrainConfig,
}

impl<'a, P> DrainOrchestrator<'a, P>
where
    P: ClusterDirectory + LoadBalancerDirectory + TargetGroupDirectory,
{
    pub fn new(plane: &'a P, config: DrainConfig) -> Self {
        Self { plane, config }
    }

    /// Run the drain inside the context's span.
    ///
    /// Returns an error only for control-plane failures; an instance that
    /// is still attached after the poll budget is a completed run with
    /// `drained = false`.
    pub async fn run(&self, ctx: &DrainContext) -> DrainResult<DrainOutcome> {
        self.drain(&ctx.instance_id).instrument(ctx.span()).await
    }

    async fn drain(&self, instance_id: &str) -> DrainResult<DrainOutcome> {
        let dry_run = self.config.dry_run;
        info!(instance = %instance_id, dry_run, "starting drain");

        let Some(placement) = locate(self.plane, instance_id).await? else {
            info!(instance = %instance_id, "instance not found in any cluster, nothing to drain");
            return Ok(DrainOutcome::NotInCluster);
        };
        info!(
            cluster = %placement.cluster,
            container_instance = %placement.container_instance,
            "located container instance"
        );

        let tasks = tasks_on(self.plane, &placement).await?;
        if tasks.is_empty() {
            info!(container_instance = %placement.container_instance, "found no tasks");
            return Ok(DrainOutcome::NoTasks(placement));
        }
        info!(count = tasks.len(), ?tasks, "found running tasks");

        let services = services_for(self.plane, &placement.cluster, &tasks).await?;
        let endpoints = Endpoints::collect(services.values());
        info!(
            services = ?services.keys().collect::<Vec<_>>(),
            elbs = ?endpoints.load_balancers,
            tgs = ?endpoints.target_groups,
            "collected traffic endpoints"
        );

        let timeout_secs = max_drain_timeout(self.plane, &endpoints).await?;
        info!(timeout_secs, "found max draining time");

        let deregistered = if dry_run {
            info!(timeout_secs, "dry run: skipping deregistration and drain wait");
            false
        } else {
            deregister(self.plane, &placement).await?;
            info!(timeout_secs, "waiting for connections to drain");
            tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
            true
        };

        info!("checking that instance has been removed from ELBs and TGs");
        let poll = HealthPoller::new(self.plane, self.config.poll_config())
            .await_drained(instance_id, &endpoints.load_balancers, &endpoints.target_groups)
            .await?;

        if poll.drained {
            info!(attempts = poll.attempts, "drain complete");
        } else {
            warn!(
                attempts = poll.attempts,
                "instance not confirmed drained, leaving termination to the lifecycle hook"
            );
        }

        Ok(DrainOutcome::Completed(DrainRun {
            instance_id: instance_id.to_string(),
            placement,
            tasks,
            services: services.into_keys().collect(),
            endpoints,
            timeout_secs,
            deregistered,
            poll,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecsdrain_plane::Inventory;

    fn inventory() -> Inventory {
        Inventory::from_json(
            r#"{
                "clusters": [{
                    "id": "c",
                    "container_instances": [{"id": "ci/1", "ec2_instance_id": "i-A", "tasks": [
                        {"id": "t/1", "task_definition": "web:1"}
                    ]}],
                    "services": [{"id": "svc/web", "task_definition": "web:1",
                        "load_balancers": [{"load_balancer_name": "legacy"}]}]
                }],
                "load_balancers": [{
                    "name": "legacy",
                    "draining": {"enabled": true, "timeout_secs": 15},
                    "instances": {"i-A": ["OutOfService"]}
                }]
            }"#,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn completed_run_reports_everything() {
        let inv = inventory();
        let outcome = DrainOrchestrator::new(&inv, DrainConfig::default())
            .run(&DrainContext::local("i-A"))
            .await
            .unwrap();

        let DrainOutcome::Completed(run) = outcome else {
            panic!("expected a completed run, got {outcome:?}");
        };
        assert_eq!(run.placement.cluster, "c");
        assert_eq!(run.tasks, vec!["t/1"]);
        assert_eq!(run.services, vec!["svc/web"]);
        assert_eq!(run.endpoints.load_balancers, vec!["legacy"]);
        assert_eq!(run.timeout_secs, 15);
        assert!(run.deregistered);
        assert!(run.drained());
    }

    #[tokio::test(start_paused = true)]
    async fn outcome_serializes_with_tag() {
        let inv = inventory();
        let outcome = DrainOrchestrator::new(&inv, DrainConfig::default())
            .run(&DrainContext::local("i-A"))
            .await
            .unwrap();

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "completed");
        assert_eq!(json["cluster"], "c");
        assert_eq!(json["load_balancers"][0], "legacy");
        assert_eq!(json["poll"]["drained"], true);

        let json = serde_json::to_value(DrainOutcome::NotInCluster).unwrap();
        assert_eq!(json["outcome"], "not_in_cluster");
    }
}
