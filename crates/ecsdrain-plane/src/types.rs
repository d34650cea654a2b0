//! Domain types exchanged with the control plane.
//!
//! These mirror the subset of the ECS, ELB, ELBv2 and autoscaling
//! responses the drain core reads. All types are serializable so the
//! in-memory inventory can be loaded from a JSON snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// ECS cluster identifier (ARN or name).
pub type ClusterId = String;

/// Container-instance handle within a cluster.
pub type ContainerInstanceId = String;

/// EC2 instance identifier, e.g. `i-0c315bd8daf18cf20`.
pub type InstanceId = String;

/// Task identifier (ARN).
pub type TaskId = String;

/// Service identifier (ARN).
pub type ServiceId = String;

/// Target-group attribute carrying the deregistration delay in seconds.
pub const DEREGISTRATION_DELAY_KEY: &str = "deregistration_delay.timeout_seconds";

// ── Cluster / workload ────────────────────────────────────────────

/// A cluster's internal handle for an EC2 instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerInstance {
    pub id: ContainerInstanceId,
    pub ec2_instance_id: InstanceId,
}

/// A task scheduled on a container instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub task_definition: String,
}

/// A service and the traffic endpoints attached to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    pub id: ServiceId,
    pub task_definition: String,
    #[serde(default)]
    pub load_balancers: Vec<LoadBalancerAttachment>,
}

/// One entry of a service's `loadBalancers` list.
///
/// The control plane fills in either the classic load-balancer name or
/// the target-group ARN.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadBalancerAttachment {
    #[serde(default)]
    pub load_balancer_name: Option<String>,
    #[serde(default)]
    pub target_group_arn: Option<String>,
    #[serde(default)]
    pub container_name: Option<String>,
    #[serde(default)]
    pub container_port: Option<u16>,
}

impl LoadBalancerAttachment {
    /// Classify the attachment. A load-balancer name wins over a target group.
    pub fn endpoint(&self) -> Option<EndpointRef> {
        if let Some(name) = &self.load_balancer_name {
            Some(EndpointRef::LoadBalancer(name.clone()))
        } else {
            self.target_group_arn
                .as_ref()
                .map(|arn| EndpointRef::TargetGroup(arn.clone()))
        }
    }
}

/// Reference to a traffic-routing object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EndpointRef {
    LoadBalancer(String),
    TargetGroup(String),
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadBalancer(name) => write!(f, "elb/{name}"),
            Self::TargetGroup(arn) => write!(f, "tg/{arn}"),
        }
    }
}

// ── Load balancers ────────────────────────────────────────────────

/// Connection-draining attributes of a classic load balancer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionDraining {
    pub enabled: bool,
    #[serde(default)]
    pub timeout_secs: u64,
}

/// A key/value attribute of a target group. Values are always strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetGroupAttribute {
    pub key: String,
    pub value: String,
}

/// Health of one registered target in a target group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetHealth {
    pub target_id: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub state: String,
}

// ── Lifecycle ─────────────────────────────────────────────────────

/// Outcome reported when completing a lifecycle action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleActionResult {
    Continue,
}

impl LifecycleActionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "CONTINUE",
        }
    }
}

/// A request to resolve a pending scale-down lifecycle action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LifecycleAction {
    pub hook_name: String,
    pub group_name: String,
    pub token: String,
    pub instance_id: InstanceId,
    pub result: LifecycleActionResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_prefers_load_balancer_name() {
        let att = LoadBalancerAttachment {
            load_balancer_name: Some("web-elb".to_string()),
            target_group_arn: Some("tg-1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            att.endpoint(),
            Some(EndpointRef::LoadBalancer("web-elb".to_string()))
        );
    }

    #[test]
    fn attachment_without_references_is_ignored() {
        assert_eq!(LoadBalancerAttachment::default().endpoint(), None);
    }

    #[test]
    fn service_without_load_balancers_deserializes() {
        let svc: Service =
            serde_json::from_str(r#"{"id":"svc/a","task_definition":"td/a:1"}"#).unwrap();
        assert!(svc.load_balancers.is_empty());
    }

    #[test]
    fn lifecycle_result_wire_names() {
        assert_eq!(LifecycleActionResult::Continue.as_str(), "CONTINUE");
        let json = serde_json::to_string(&LifecycleActionResult::Continue).unwrap();
        assert_eq!(json, "\"CONTINUE\"");
    }

    #[test]
    fn endpoint_display() {
        assert_eq!(EndpointRef::LoadBalancer("a".into()).to_string(), "elb/a");
        assert_eq!(EndpointRef::TargetGroup("b".into()).to_string(), "tg/b");
    }
}
