//! In-memory control plane.
//!
//! Implements every directory trait over a JSON snapshot of clusters,
//! load balancers and target groups. Health states are scripted as
//! sequences: each query advances one step and the last state repeats.
//! Every call is recorded, and individual operations can be made to fail,
//! which makes the inventory the backend for tests and rehearsal runs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::directory::*;
use crate::error::{PlaneError, PlaneResult};
use crate::types::*;

// ── Snapshot ──────────────────────────────────────────────────────

/// Serializable view of the whole control plane.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InventorySnapshot {
    #[serde(default)]
    pub clusters: Vec<ClusterRecord>,
    #[serde(default)]
    pub load_balancers: Vec<LoadBalancerRecord>,
    #[serde(default)]
    pub target_groups: Vec<TargetGroupRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterRecord {
    pub id: ClusterId,
    #[serde(default)]
    pub container_instances: Vec<ContainerInstanceRecord>,
    #[serde(default)]
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContainerInstanceRecord {
    pub id: ContainerInstanceId,
    pub ec2_instance_id: InstanceId,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadBalancerRecord {
    pub name: String,
    #[serde(default)]
    pub draining: ConnectionDraining,
    /// Successive health states per registered instance.
    #[serde(default)]
    pub instances: BTreeMap<InstanceId, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetGroupRecord {
    pub arn: String,
    #[serde(default)]
    pub attributes: Vec<TargetGroupAttribute>,
    #[serde(default)]
    pub targets: Vec<TargetRecord>,
}

/// A registered target and its successive health states.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetRecord {
    pub id: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub states: Vec<String>,
}

// ── Call log ──────────────────────────────────────────────────────

/// A recorded control-plane call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaneCall {
    ListClusters,
    ListContainerInstances { cluster: String },
    DescribeContainerInstances { cluster: String, count: usize },
    ListTasks { cluster: String, container_instance: String },
    DescribeTasks { cluster: String, count: usize },
    ListServices { cluster: String },
    DescribeServices { cluster: String, count: usize },
    DeregisterContainerInstance { cluster: String, container_instance: String, force: bool },
    DescribeInstanceHealth { load_balancer: String, instance_id: String },
    DescribeConnectionDraining { load_balancer: String },
    DescribeTargetHealth { target_group: String },
    DescribeTargetGroupAttributes { target_group: String },
    CompleteLifecycleAction(LifecycleAction),
}

impl PlaneCall {
    /// Control-plane operation name, as used for failure injection.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::ListClusters => "ListClusters",
            Self::ListContainerInstances { .. } => "ListContainerInstances",
            Self::DescribeContainerInstances { .. } => "DescribeContainerInstances",
            Self::ListTasks { .. } => "ListTasks",
            Self::DescribeTasks { .. } => "DescribeTasks",
            Self::ListServices { .. } => "ListServices",
            Self::DescribeServices { .. } => "DescribeServices",
            Self::DeregisterContainerInstance { .. } => "DeregisterContainerInstance",
            Self::DescribeInstanceHealth { .. } => "DescribeInstanceHealth",
            Self::DescribeConnectionDraining { .. } => "DescribeLoadBalancerAttributes",
            Self::DescribeTargetHealth { .. } => "DescribeTargetHealth",
            Self::DescribeTargetGroupAttributes { .. } => "DescribeTargetGroupAttributes",
            Self::CompleteLifecycleAction(_) => "CompleteLifecycleAction",
        }
    }

    /// Whether the call touches load-balancer or target-group health.
    pub fn is_health_query(&self) -> bool {
        matches!(
            self,
            Self::DescribeInstanceHealth { .. } | Self::DescribeTargetHealth { .. }
        )
    }
}

// ── Inventory ─────────────────────────────────────────────────────

struct InventoryState {
    snapshot: InventorySnapshot,
    calls: Vec<PlaneCall>,
    /// Health queries served per endpoint, drives the scripted sequences.
    health_queries: HashMap<String, usize>,
    failing: HashSet<&'static str>,
}

/// In-memory control plane backed by an [`InventorySnapshot`].
pub struct Inventory {
    state: Mutex<InventoryState>,
}

impl Inventory {
    /// Create an inventory from a snapshot.
    pub fn new(snapshot: InventorySnapshot) -> Self {
        Self {
            state: Mutex::new(InventoryState {
                snapshot,
                calls: Vec::new(),
                health_queries: HashMap::new(),
                failing: HashSet::new(),
            }),
        }
    }

    /// Parse a JSON snapshot.
    pub fn from_json(json: &str) -> PlaneResult<Self> {
        let snapshot: InventorySnapshot =
            serde_json::from_str(json).map_err(|e| PlaneError::Inventory(e.to_string()))?;
        Ok(Self::new(snapshot))
    }

    /// Load a JSON snapshot from disk.
    pub fn from_file(path: &Path) -> PlaneResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PlaneError::Inventory(format!("{}: {e}", path.display())))?;
        let inventory = Self::from_json(&content)?;
        debug!(?path, "inventory loaded");
        Ok(inventory)
    }

    /// Make every call to `operation` fail with an API error.
    pub fn with_failure(self, operation: &'static str) -> Self {
        self.lock().failing.insert(operation);
        self
    }

    /// All calls served so far, in order.
    pub fn calls(&self) -> Vec<PlaneCall> {
        self.lock().calls.clone()
    }

    /// Number of calls made to `operation`.
    pub fn count(&self, operation: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    /// `(cluster, container_instance)` pairs that were deregistered.
    pub fn deregistrations(&self) -> Vec<(String, String)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                PlaneCall::DeregisterContainerInstance {
                    cluster,
                    container_instance,
                    ..
                } => Some((cluster.clone(), container_instance.clone())),
                _ => None,
            })
            .collect()
    }

    /// Number of load-balancer and target-group health queries served.
    pub fn health_query_count(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.is_health_query()).count()
    }

    /// Lifecycle actions completed through this inventory.
    pub fn completed_actions(&self) -> Vec<LifecycleAction> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                PlaneCall::CompleteLifecycleAction(action) => Some(action.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether `cluster` still holds `container_instance`.
    pub fn has_container_instance(&self, cluster: &str, container_instance: &str) -> bool {
        self.lock()
            .snapshot
            .clusters
            .iter()
            .filter(|c| c.id == cluster)
            .flat_map(|c| &c.container_instances)
            .any(|ci| ci.id == container_instance)
    }

    fn lock(&self) -> MutexGuard<'_, InventoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `call` and return the locked state, or the injected failure.
    fn serve(&self, call: PlaneCall) -> PlaneResult<MutexGuard<'_, InventoryState>> {
        let mut state = self.lock();
        let operation = call.operation();
        state.calls.push(call);
        if state.failing.contains(operation) {
            return Err(PlaneError::Api {
                operation,
                message: "injected failure".to_string(),
            });
        }
        Ok(state)
    }
}

impl InventoryState {
    fn cluster(&self, operation: &'static str, id: &str) -> PlaneResult<&ClusterRecord> {
        self.snapshot
            .clusters
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| PlaneError::Api {
                operation,
                message: format!("ClusterNotFoundException: {id}"),
            })
    }

    /// Next step of a scripted health sequence for `key`.
    fn next_step(&mut self, key: String) -> usize {
        let served = self.health_queries.entry(key).or_insert(0);
        let step = *served;
        *served += 1;
        step
    }
}

/// Pick the state at `step`, repeating the last one once exhausted.
fn scripted(states: &[String], step: usize) -> Option<String> {
    states.get(step).or_else(|| states.last()).cloned()
}

impl ClusterDirectory for Inventory {
    async fn list_clusters(&self) -> PlaneResult<Vec<ClusterId>> {
        let state = self.serve(PlaneCall::ListClusters)?;
        Ok(state.snapshot.clusters.iter().map(|c| c.id.clone()).collect())
    }

    async fn list_container_instances(&self, cluster: &str) -> PlaneResult<Vec<ContainerInstanceId>> {
        let state = self.serve(PlaneCall::ListContainerInstances {
            cluster: cluster.to_string(),
        })?;
        let record = state.cluster("ListContainerInstances", cluster)?;
        Ok(record.container_instances.iter().map(|ci| ci.id.clone()).collect())
    }

    async fn describe_container_instances(
        &self,
        cluster: &str,
        ids: &[ContainerInstanceId],
    ) -> PlaneResult<Vec<ContainerInstance>> {
        let state = self.serve(PlaneCall::DescribeContainerInstances {
            cluster: cluster.to_string(),
            count: ids.len(),
        })?;
        let record = state.cluster("DescribeContainerInstances", cluster)?;
        Ok(record
            .container_instances
            .iter()
            .filter(|ci| ids.contains(&ci.id))
            .map(|ci| ContainerInstance {
                id: ci.id.clone(),
                ec2_instance_id: ci.ec2_instance_id.clone(),
            })
            .collect())
    }

    async fn list_tasks(&self, cluster: &str, container_instance: &str) -> PlaneResult<Vec<TaskId>> {
        let state = self.serve(PlaneCall::ListTasks {
            cluster: cluster.to_string(),
            container_instance: container_instance.to_string(),
        })?;
        let record = state.cluster("ListTasks", cluster)?;
        let ci = record
            .container_instances
            .iter()
            .find(|ci| ci.id == container_instance)
            .ok_or_else(|| PlaneError::Api {
                operation: "ListTasks",
                message: format!("InvalidParameterException: unknown container instance {container_instance}"),
            })?;
        Ok(ci.tasks.iter().map(|t| t.id.clone()).collect())
    }

    async fn describe_tasks(&self, cluster: &str, ids: &[TaskId]) -> PlaneResult<Vec<Task>> {
        let state = self.serve(PlaneCall::DescribeTasks {
            cluster: cluster.to_string(),
            count: ids.len(),
        })?;
        let record = state.cluster("DescribeTasks", cluster)?;
        Ok(record
            .container_instances
            .iter()
            .flat_map(|ci| &ci.tasks)
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn list_services(&self, cluster: &str) -> PlaneResult<Vec<ServiceId>> {
        let state = self.serve(PlaneCall::ListServices {
            cluster: cluster.to_string(),
        })?;
        let record = state.cluster("ListServices", cluster)?;
        Ok(record.services.iter().map(|s| s.id.clone()).collect())
    }

    async fn describe_services(&self, cluster: &str, ids: &[ServiceId]) -> PlaneResult<Vec<Service>> {
        let state = self.serve(PlaneCall::DescribeServices {
            cluster: cluster.to_string(),
            count: ids.len(),
        })?;
        let record = state.cluster("DescribeServices", cluster)?;
        Ok(record
            .services
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn deregister_container_instance(
        &self,
        cluster: &str,
        container_instance: &str,
        force: bool,
    ) -> PlaneResult<()> {
        let mut state = self.serve(PlaneCall::DeregisterContainerInstance {
            cluster: cluster.to_string(),
            container_instance: container_instance.to_string(),
            force,
        })?;
        let record = state
            .snapshot
            .clusters
            .iter_mut()
            .find(|c| c.id == cluster)
            .ok_or_else(|| PlaneError::Api {
                operation: "DeregisterContainerInstance",
                message: format!("ClusterNotFoundException: {cluster}"),
            })?;

        let position = record
            .container_instances
            .iter()
            .position(|ci| ci.id == container_instance)
            .ok_or_else(|| PlaneError::Api {
                operation: "DeregisterContainerInstance",
                message: format!("InvalidParameterException: unknown container instance {container_instance}"),
            })?;

        if !force && !record.container_instances[position].tasks.is_empty() {
            return Err(PlaneError::Api {
                operation: "DeregisterContainerInstance",
                message: "InvalidParameterException: container instance has running tasks".to_string(),
            });
        }

        record.container_instances.remove(position);
        debug!(%cluster, %container_instance, "container instance removed from inventory");
        Ok(())
    }
}

impl LoadBalancerDirectory for Inventory {
    async fn describe_instance_health(
        &self,
        load_balancer: &str,
        instance_id: &str,
    ) -> PlaneResult<Option<String>> {
        let mut state = self.serve(PlaneCall::DescribeInstanceHealth {
            load_balancer: load_balancer.to_string(),
            instance_id: instance_id.to_string(),
        })?;
        let states = state
            .snapshot
            .load_balancers
            .iter()
            .find(|lb| lb.name == load_balancer)
            .ok_or_else(|| PlaneError::Api {
                operation: "DescribeInstanceHealth",
                message: format!("LoadBalancerNotFound: {load_balancer}"),
            })?
            .instances
            .get(instance_id)
            .cloned()
            .unwrap_or_default();

        let step = state.next_step(format!("elb/{load_balancer}/{instance_id}"));
        Ok(scripted(&states, step))
    }

    async fn describe_connection_draining(&self, load_balancer: &str) -> PlaneResult<ConnectionDraining> {
        let state = self.serve(PlaneCall::DescribeConnectionDraining {
            load_balancer: load_balancer.to_string(),
        })?;
        state
            .snapshot
            .load_balancers
            .iter()
            .find(|lb| lb.name == load_balancer)
            .map(|lb| lb.draining)
            .ok_or_else(|| PlaneError::Api {
                operation: "DescribeLoadBalancerAttributes",
                message: format!("LoadBalancerNotFound: {load_balancer}"),
            })
    }
}

impl TargetGroupDirectory for Inventory {
    async fn describe_target_health(&self, target_group: &str) -> PlaneResult<Vec<TargetHealth>> {
        let mut state = self.serve(PlaneCall::DescribeTargetHealth {
            target_group: target_group.to_string(),
        })?;
        let targets = state
            .snapshot
            .target_groups
            .iter()
            .find(|tg| tg.arn == target_group)
            .ok_or_else(|| PlaneError::Api {
                operation: "DescribeTargetHealth",
                message: format!("TargetGroupNotFound: {target_group}"),
            })?
            .targets
            .clone();

        let step = state.next_step(format!("tg/{target_group}"));
        Ok(targets
            .into_iter()
            .filter_map(|t| {
                scripted(&t.states, step).map(|s| TargetHealth {
                    target_id: t.id,
                    port: t.port,
                    state: s,
                })
            })
            .collect())
    }

    async fn describe_target_group_attributes(
        &self,
        target_group: &str,
    ) -> PlaneResult<Vec<TargetGroupAttribute>> {
        let state = self.serve(PlaneCall::DescribeTargetGroupAttributes {
            target_group: target_group.to_string(),
        })?;
        state
            .snapshot
            .target_groups
            .iter()
            .find(|tg| tg.arn == target_group)
            .map(|tg| tg.attributes.clone())
            .ok_or_else(|| PlaneError::Api {
                operation: "DescribeTargetGroupAttributes",
                message: format!("TargetGroupNotFound: {target_group}"),
            })
    }
}

impl LifecycleSignaler for Inventory {
    async fn complete_lifecycle_action(&self, action: &LifecycleAction) -> PlaneResult<()> {
        let _state = self.serve(PlaneCall::CompleteLifecycleAction(action.clone()))?;
        debug!(
            hook = %action.hook_name,
            group = %action.group_name,
            instance = %action.instance_id,
            result = action.result.as_str(),
            "lifecycle action completed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "clusters": [{
            "id": "cluster/web",
            "container_instances": [{
                "id": "ci/1",
                "ec2_instance_id": "i-A",
                "tasks": [{"id": "task/1", "task_definition": "td/web:3"}]
            }],
            "services": [{
                "id": "svc/web",
                "task_definition": "td/web:3",
                "load_balancers": [{"target_group_arn": "tg-1"}]
            }]
        }],
        "load_balancers": [{
            "name": "legacy",
            "draining": {"enabled": true, "timeout_secs": 20},
            "instances": {"i-A": ["InService", "OutOfService"]}
        }],
        "target_groups": [{
            "arn": "tg-1",
            "attributes": [{"key": "deregistration_delay.timeout_seconds", "value": "30"}],
            "targets": [{"id": "i-A", "port": 8080, "states": ["healthy", "draining", "unused"]}]
        }]
    }"#;

    fn inventory() -> Inventory {
        Inventory::from_json(SNAPSHOT).unwrap()
    }

    #[tokio::test]
    async fn lists_and_describes_cluster_contents() {
        let inv = inventory();
        assert_eq!(inv.list_clusters().await.unwrap(), vec!["cluster/web"]);

        let cis = inv.list_container_instances("cluster/web").await.unwrap();
        let described = inv.describe_container_instances("cluster/web", &cis).await.unwrap();
        assert_eq!(described[0].ec2_instance_id, "i-A");

        let tasks = inv.list_tasks("cluster/web", "ci/1").await.unwrap();
        assert_eq!(tasks, vec!["task/1"]);
        let described = inv.describe_tasks("cluster/web", &tasks).await.unwrap();
        assert_eq!(described[0].task_definition, "td/web:3");
    }

    #[tokio::test]
    async fn unknown_cluster_is_an_api_error() {
        let inv = inventory();
        let err = inv.list_services("cluster/missing").await.unwrap_err();
        assert_eq!(err.operation(), Some("ListServices"));
    }

    #[tokio::test]
    async fn load_balancer_health_advances_and_repeats_last_state() {
        let inv = inventory();
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(inv.describe_instance_health("legacy", "i-A").await.unwrap());
        }
        assert_eq!(
            seen,
            vec![
                Some("InService".to_string()),
                Some("OutOfService".to_string()),
                Some("OutOfService".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn unregistered_instance_has_no_load_balancer_state() {
        let inv = inventory();
        let state = inv.describe_instance_health("legacy", "i-Z").await.unwrap();
        assert_eq!(state, None);
    }

    #[tokio::test]
    async fn target_health_follows_script() {
        let inv = inventory();
        let first = inv.describe_target_health("tg-1").await.unwrap();
        let second = inv.describe_target_health("tg-1").await.unwrap();
        assert_eq!(first[0].state, "healthy");
        assert_eq!(second[0].state, "draining");
        assert_eq!(inv.health_query_count(), 2);
    }

    #[tokio::test]
    async fn forced_deregistration_removes_instance() {
        let inv = inventory();
        inv.deregister_container_instance("cluster/web", "ci/1", true)
            .await
            .unwrap();
        assert!(!inv.has_container_instance("cluster/web", "ci/1"));
        assert_eq!(
            inv.deregistrations(),
            vec![("cluster/web".to_string(), "ci/1".to_string())]
        );
    }

    #[tokio::test]
    async fn unforced_deregistration_refuses_running_tasks() {
        let inv = inventory();
        let result = inv
            .deregister_container_instance("cluster/web", "ci/1", false)
            .await;
        assert!(result.is_err());
        assert!(inv.has_container_instance("cluster/web", "ci/1"));
    }

    #[tokio::test]
    async fn injected_failure_is_recorded_and_returned() {
        let inv = inventory().with_failure("ListClusters");
        let err = inv.list_clusters().await.unwrap_err();
        assert!(matches!(err, PlaneError::Api { operation: "ListClusters", .. }));
        assert_eq!(inv.count("ListClusters"), 1);
    }

    #[tokio::test]
    async fn lifecycle_completion_is_recorded() {
        let inv = inventory();
        let action = LifecycleAction {
            hook_name: "drain-hook".to_string(),
            group_name: "web-asg".to_string(),
            token: "tok".to_string(),
            instance_id: "i-A".to_string(),
            result: LifecycleActionResult::Continue,
        };
        inv.complete_lifecycle_action(&action).await.unwrap();
        assert_eq!(inv.completed_actions(), vec![action]);
    }

    #[test]
    fn from_file_reads_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.json");
        std::fs::write(&path, SNAPSHOT).unwrap();
        let inv = Inventory::from_file(&path).unwrap();
        assert!(inv.has_container_instance("cluster/web", "ci/1"));
    }

    #[test]
    fn malformed_snapshot_is_an_inventory_error() {
        assert!(matches!(
            Inventory::from_json("{ not json"),
            Err(PlaneError::Inventory(_))
        ));
        assert!(matches!(
            Inventory::from_file(Path::new("/nonexistent/inventory.json")),
            Err(PlaneError::Inventory(_))
        ));
    }
}
