//! ecsdrain-plane — the control-plane boundary for ecsdrain.
//!
//! Everything the drain core knows about the cloud lives behind the traits
//! in [`directory`]: the ECS cluster/workload directory, the classic load
//! balancer directory, the ELBv2 target-group directory and the autoscaling
//! lifecycle signaler. The core only describes the calls it makes and the
//! responses it depends on.
//!
//! # Architecture
//!
//! ```text
//! ClusterDirectory        list/describe clusters, container instances,
//!                         tasks, services; force-deregister
//! LoadBalancerDirectory   per-instance health, connection draining
//! TargetGroupDirectory    per-target health, deregistration delay
//! LifecycleSignaler       complete a pending lifecycle action
//!
//! Inventory               in-memory implementation of all four,
//!                         loaded from a JSON snapshot
//! ```
//!
//! All traits return `impl Future + Send` so implementations can be plain
//! `async fn`s and callers stay generic over the backend.

pub mod directory;
pub mod error;
pub mod inventory;
pub mod types;

pub use directory::{ClusterDirectory, LifecycleSignaler, LoadBalancerDirectory, TargetGroupDirectory};
pub use error::{PlaneError, PlaneResult};
pub use inventory::{Inventory, InventorySnapshot, PlaneCall};
pub use types::*;
