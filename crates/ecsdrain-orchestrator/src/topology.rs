//! Cluster topology resolution.
//!
//! Finds the cluster and container-instance handle for an EC2 instance
//! by scanning clusters in listing order. The first match wins.

use serde::Serialize;
use tracing::debug;

use ecsdrain_plane::{ClusterDirectory, ClusterId, ContainerInstanceId, PlaneResult};

/// Maximum handles per `DescribeContainerInstances` call.
pub const DESCRIBE_CONTAINER_INSTANCES_BATCH: usize = 100;

/// Where an instance lives in the cluster topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub cluster: ClusterId,
    pub container_instance: ContainerInstanceId,
}

/// Locate `instance_id` across every cluster.
///
/// Returns `None` when no cluster has a container instance for it.
pub async fn locate<C: ClusterDirectory>(plane: &C, instance_id: &str) -> PlaneResult<Option<Placement>> {
    let clusters = plane.list_clusters().await?;
    debug!(instance = %instance_id, clusters = clusters.len(), "scanning clusters");

    for cluster in clusters {
        if let Some(container_instance) = find_in_cluster(plane, &cluster, instance_id).await? {
            return Ok(Some(Placement {
                cluster,
                container_instance,
            }));
        }
    }

    Ok(None)
}

/// Container-instance handle for `instance_id` within one cluster.
pub async fn find_in_cluster<C: ClusterDirectory>(
    plane: &C,
    cluster: &str,
    instance_id: &str,
) -> PlaneResult<Option<ContainerInstanceId>> {
    let handles = plane.list_container_instances(cluster).await?;

    for batch in handles.chunks(DESCRIBE_CONTAINER_INSTANCES_BATCH) {
        let described = plane.describe_container_instances(cluster, batch).await?;
        if let Some(ci) = described
            .into_iter()
            .find(|ci| ci.ec2_instance_id == instance_id)
        {
            return Ok(Some(ci.id));
        }
    }

    debug!(%cluster, instance = %instance_id, handles = handles.len(), "instance not in cluster");
    Ok(None)
}
