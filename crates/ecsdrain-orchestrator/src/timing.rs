//! Drain timing: how long connection draining may take.
//!
//! The drain timeout is the maximum over all endpoints: a classic load
//! balancer contributes its connection-draining timeout only when draining
//! is enabled; a target group always contributes its deregistration delay.

use tracing::debug;

use ecsdrain_plane::{
    DEREGISTRATION_DELAY_KEY, LoadBalancerDirectory, PlaneError, PlaneResult, TargetGroupAttribute,
    TargetGroupDirectory,
};

use crate::endpoints::Endpoints;

/// Maximum drain timeout in seconds across `endpoints`. Zero when empty.
pub async fn max_drain_timeout<P>(plane: &P, endpoints: &Endpoints) -> PlaneResult<u64>
where
    P: LoadBalancerDirectory + TargetGroupDirectory,
{
    let mut max_timeout = 0;

    for lb in &endpoints.load_balancers {
        let draining = plane.describe_connection_draining(lb).await?;
        let timeout = if draining.enabled { draining.timeout_secs } else { 0 };
        debug!(
            load_balancer = %lb,
            enabled = draining.enabled,
            timeout_secs = draining.timeout_secs,
            "connection draining"
        );
        max_timeout = max_timeout.max(timeout);
    }

    for tg in &endpoints.target_groups {
        let attributes = plane.describe_target_group_attributes(tg).await?;
        let delay = deregistration_delay(&attributes)?.unwrap_or(0);
        debug!(target_group = %tg, delay_secs = delay, "deregistration delay");
        max_timeout = max_timeout.max(delay);
    }

    Ok(max_timeout)
}

/// Parse `deregistration_delay.timeout_seconds` out of a target group's attributes.
pub fn deregistration_delay(attributes: &[TargetGroupAttribute]) -> PlaneResult<Option<u64>> {
    attributes
        .iter()
        .find(|a| a.key == DEREGISTRATION_DELAY_KEY)
        .map(|a| {
            a.value.trim().parse::<u64>().map_err(|e| PlaneError::Malformed {
                operation: "DescribeTargetGroupAttributes",
                message: format!("{DEREGISTRATION_DELAY_KEY}={:?}: {e}", a.value),
            })
        })
        .transpose()
}
