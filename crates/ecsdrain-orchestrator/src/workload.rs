//! Workload inspection: tasks on a container instance and their services.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use ecsdrain_plane::{ClusterDirectory, PlaneResult, Service, ServiceId, TaskId};

use crate::topology::Placement;

/// Maximum ids per `DescribeTasks` call.
pub const DESCRIBE_TASKS_BATCH: usize = 100;

/// Maximum ids per `DescribeServices` call.
pub const DESCRIBE_SERVICES_BATCH: usize = 10;

/// Tasks currently running on the placed container instance.
pub async fn tasks_on<C: ClusterDirectory>(plane: &C, placement: &Placement) -> PlaneResult<Vec<TaskId>> {
    plane
        .list_tasks(&placement.cluster, &placement.container_instance)
        .await
}

/// Services in `cluster` whose task definition matches one of `tasks`.
///
/// Services that share no task definition with the instance's tasks are
/// excluded even when active elsewhere in the cluster.
pub async fn services_for<C: ClusterDirectory>(
    plane: &C,
    cluster: &str,
    tasks: &[TaskId],
) -> PlaneResult<BTreeMap<ServiceId, Service>> {
    let mut definitions = HashSet::new();
    for batch in tasks.chunks(DESCRIBE_TASKS_BATCH) {
        for task in plane.describe_tasks(cluster, batch).await? {
            definitions.insert(task.task_definition);
        }
    }
    debug!(%cluster, definitions = definitions.len(), "resolved task definitions");

    let service_ids = plane.list_services(cluster).await?;
    let mut services = BTreeMap::new();

    for batch in service_ids.chunks(DESCRIBE_SERVICES_BATCH) {
        for service in plane.describe_services(cluster, batch).await? {
            if definitions.contains(&service.task_definition) {
                services.entry(service.id.clone()).or_insert(service);
            }
        }
    }

    debug!(
        %cluster,
        listed = service_ids.len(),
        matched = services.len(),
        "resolved services for tasks"
    );
    Ok(services)
}
