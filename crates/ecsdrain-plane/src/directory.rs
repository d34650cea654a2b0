//! Control-plane traits.
//!
//! Each trait groups the calls against one resource family. Reads are
//! treated as idempotent; `deregister_container_instance` and
//! `complete_lifecycle_action` are the only mutating calls.

use std::future::Future;

use crate::error::PlaneResult;
use crate::types::*;

/// ECS cluster and workload directory.
pub trait ClusterDirectory: Send + Sync {
    /// All clusters, in the control plane's listing order.
    fn list_clusters(&self) -> impl Future<Output = PlaneResult<Vec<ClusterId>>> + Send;

    /// Container-instance handles registered in `cluster`.
    fn list_container_instances(
        &self,
        cluster: &str,
    ) -> impl Future<Output = PlaneResult<Vec<ContainerInstanceId>>> + Send;

    /// Describe up to 100 container-instance handles.
    fn describe_container_instances(
        &self,
        cluster: &str,
        ids: &[ContainerInstanceId],
    ) -> impl Future<Output = PlaneResult<Vec<ContainerInstance>>> + Send;

    /// Running task ids scoped to one container instance.
    fn list_tasks(
        &self,
        cluster: &str,
        container_instance: &str,
    ) -> impl Future<Output = PlaneResult<Vec<TaskId>>> + Send;

    /// Describe up to 100 tasks.
    fn describe_tasks(
        &self,
        cluster: &str,
        ids: &[TaskId],
    ) -> impl Future<Output = PlaneResult<Vec<Task>>> + Send;

    /// All service ids in `cluster`.
    fn list_services(&self, cluster: &str)
    -> impl Future<Output = PlaneResult<Vec<ServiceId>>> + Send;

    /// Describe up to 10 services.
    fn describe_services(
        &self,
        cluster: &str,
        ids: &[ServiceId],
    ) -> impl Future<Output = PlaneResult<Vec<Service>>> + Send;

    /// Remove a container instance from the cluster's scheduling pool.
    ///
    /// With `force` set, the instance is removed even while tasks are
    /// still running on it.
    fn deregister_container_instance(
        &self,
        cluster: &str,
        container_instance: &str,
        force: bool,
    ) -> impl Future<Output = PlaneResult<()>> + Send;
}

/// Classic (v1) load-balancer directory.
pub trait LoadBalancerDirectory: Send + Sync {
    /// Health state of `instance_id` at `load_balancer`, e.g. `InService`.
    ///
    /// `None` when the instance is not registered with the balancer.
    fn describe_instance_health(
        &self,
        load_balancer: &str,
        instance_id: &str,
    ) -> impl Future<Output = PlaneResult<Option<String>>> + Send;

    fn describe_connection_draining(
        &self,
        load_balancer: &str,
    ) -> impl Future<Output = PlaneResult<ConnectionDraining>> + Send;
}

/// ELBv2 target-group directory.
pub trait TargetGroupDirectory: Send + Sync {
    /// Health of every target registered in `target_group`.
    fn describe_target_health(
        &self,
        target_group: &str,
    ) -> impl Future<Output = PlaneResult<Vec<TargetHealth>>> + Send;

    fn describe_target_group_attributes(
        &self,
        target_group: &str,
    ) -> impl Future<Output = PlaneResult<Vec<TargetGroupAttribute>>> + Send;
}

/// Autoscaling lifecycle signaling.
pub trait LifecycleSignaler: Send + Sync {
    fn complete_lifecycle_action(
        &self,
        action: &LifecycleAction,
    ) -> impl Future<Output = PlaneResult<()>> + Send;
}
