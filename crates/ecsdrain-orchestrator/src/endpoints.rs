//! Traffic endpoint collection.

use serde::Serialize;

use ecsdrain_plane::{EndpointRef, Service};

/// Deduplicated load-balancer names and target-group ids, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Endpoints {
    pub load_balancers: Vec<String>,
    pub target_groups: Vec<String>,
}

impl Endpoints {
    /// Walk every service's load-balancer attachments.
    pub fn collect<'a>(services: impl IntoIterator<Item = &'a Service>) -> Self {
        let mut endpoints = Self::default();
        for service in services {
            for attachment in &service.load_balancers {
                if let Some(endpoint) = attachment.endpoint() {
                    endpoints.insert(endpoint);
                }
            }
        }
        endpoints
    }

    /// Add an endpoint. Returns false if it was already present.
    pub fn insert(&mut self, endpoint: EndpointRef) -> bool {
        let (list, id) = match endpoint {
            EndpointRef::LoadBalancer(name) => (&mut self.load_balancers, name),
            EndpointRef::TargetGroup(arn) => (&mut self.target_groups, arn),
        };
        if list.contains(&id) {
            return false;
        }
        list.push(id);
        true
    }

    pub fn len(&self) -> usize {
        self.load_balancers.len() + self.target_groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
