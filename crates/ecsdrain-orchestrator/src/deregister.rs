//! Forced container-instance deregistration.
//!
//! Force removal does not wait for tasks to stop. It is issued once, right
//! before the drain wait, and never retried.

use tracing::{error, info};

use ecsdrain_plane::ClusterDirectory;

use crate::error::{DrainError, DrainResult};
use crate::topology::Placement;

pub async fn deregister<C: ClusterDirectory>(plane: &C, placement: &Placement) -> DrainResult<()> {
    info!(
        cluster = %placement.cluster,
        container_instance = %placement.container_instance,
        "deregistering container instance from cluster"
    );

    plane
        .deregister_container_instance(&placement.cluster, &placement.container_instance, true)
        .await
        .map_err(|source| {
            error!(
                cluster = %placement.cluster,
                container_instance = %placement.container_instance,
                error = %source,
                "deregistration failed"
            );
            DrainError::Deregister {
                cluster: placement.cluster.clone(),
                container_instance: placement.container_instance.clone(),
                source,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecsdrain_plane::{Inventory, PlaneCall};

    fn inventory() -> Inventory {
        Inventory::from_json(
            r#"{"clusters": [{"id": "c", "container_instances": [
                {"id": "ci/1", "ec2_instance_id": "i-A", "tasks": [{"id": "t/1", "task_definition": "web:1"}]}
            ]}]}"#,
        )
        .unwrap()
    }

    fn placement() -> Placement {
        Placement {
            cluster: "c".to_string(),
            container_instance: "ci/1".to_string(),
        }
    }

    #[tokio::test]
    async fn deregisters_with_force() {
        let inv = inventory();
        deregister(&inv, &placement()).await.unwrap();

        assert!(inv.calls().contains(&PlaneCall::DeregisterContainerInstance {
            cluster: "c".to_string(),
            container_instance: "ci/1".to_string(),
            force: true,
        }));
        assert!(!inv.has_container_instance("c", "ci/1"));
    }

    #[tokio::test]
    async fn failure_is_not_retried() {
        let inv = inventory().with_failure("DeregisterContainerInstance");
        let err = deregister(&inv, &placement()).await.unwrap_err();

        assert!(matches!(err, DrainError::Deregister { .. }));
        assert_eq!(inv.count("DeregisterContainerInstance"), 1);
    }
}
