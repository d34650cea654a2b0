//! Single-attempt health check.
//!
//! Queries every endpoint once for the instance and classifies the
//! reported states.

use tracing::{debug, info};

use ecsdrain_plane::{EndpointRef, LoadBalancerDirectory, PlaneResult, TargetGroupDirectory};

/// Classic load-balancer state meaning the instance takes traffic.
pub const IN_SERVICE: &str = "InService";

/// Placeholder state logged when an endpoint has no entry for the instance.
pub const ABSENT: &str = "absent";

/// How an endpoint currently treats the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    /// Routing new traffic to the instance.
    Serving,
    /// Finishing in-flight connections.
    Draining,
    /// No longer routing to the instance.
    Removed,
}

impl EndpointState {
    /// Classify a classic load balancer's instance state.
    pub fn from_load_balancer(state: Option<&str>) -> Self {
        match state {
            Some(IN_SERVICE) => Self::Serving,
            _ => Self::Removed,
        }
    }

    /// Classify a target group's per-target state.
    pub fn from_target_group(state: &str) -> Self {
        match state {
            "healthy" => Self::Serving,
            "draining" => Self::Draining,
            _ => Self::Removed,
        }
    }

    /// Whether the instance still receives or finishes traffic here.
    pub fn holds_traffic(&self) -> bool {
        !matches!(self, Self::Removed)
    }
}

/// One endpoint's answer within an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointReport {
    pub endpoint: EndpointRef,
    /// Raw state string, or [`ABSENT`].
    pub state: String,
    pub verdict: EndpointState,
}

/// Result of querying all endpoints once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptReport {
    pub endpoints: Vec<EndpointReport>,
}

impl AttemptReport {
    /// True when no endpoint still holds traffic for the instance.
    pub fn is_complete(&self) -> bool {
        self.endpoints.iter().all(|e| !e.verdict.holds_traffic())
    }

    /// Endpoints still holding traffic.
    pub fn pending(&self) -> Vec<&EndpointReport> {
        self.endpoints
            .iter()
            .filter(|e| e.verdict.holds_traffic())
            .collect()
    }
}

/// Query every load balancer and target group once for `instance_id`.
pub async fn check_once<P>(
    plane: &P,
    instance_id: &str,
    load_balancers: &[String],
    target_groups: &[String],
) -> PlaneResult<AttemptReport>
where
    P: LoadBalancerDirectory + TargetGroupDirectory,
{
    let mut report = AttemptReport::default();

    for lb in load_balancers {
        let state = plane.describe_instance_health(lb, instance_id).await?;
        let verdict = EndpointState::from_load_balancer(state.as_deref());
        let state = state.unwrap_or_else(|| ABSENT.to_string());
        info!(load_balancer = %lb, instance = %instance_id, %state, "ELB health");
        report.endpoints.push(EndpointReport {
            endpoint: EndpointRef::LoadBalancer(lb.clone()),
            state,
            verdict,
        });
    }

    for tg in target_groups {
        let targets = plane.describe_target_health(tg).await?;
        let mut found = false;
        for target in targets.iter().filter(|t| t.target_id == instance_id) {
            found = true;
            info!(
                target_group = %tg,
                instance = %instance_id,
                port = ?target.port,
                state = %target.state,
                "TG health"
            );
            report.endpoints.push(EndpointReport {
                endpoint: EndpointRef::TargetGroup(tg.clone()),
                state: target.state.clone(),
                verdict: EndpointState::from_target_group(&target.state),
            });
        }
        if !found {
            debug!(target_group = %tg, instance = %instance_id, "instance not registered in target group");
            report.endpoints.push(EndpointReport {
                endpoint: EndpointRef::TargetGroup(tg.clone()),
                state: ABSENT.to_string(),
                verdict: EndpointState::Removed,
            });
        }
    }

    Ok(report)
}
