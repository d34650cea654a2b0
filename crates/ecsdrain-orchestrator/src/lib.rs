//! ecsdrain-orchestrator — drains one EC2 instance from ECS and its load balancers.
//!
//! Sequences the drain of a single instance ahead of an autoscaling
//! scale-down: find the container instance, find the services whose tasks
//! run on it, collect the load balancers and target groups in front of
//! those services, compute how long connection draining may take, force
//! the container instance out of the cluster, wait, then confirm the
//! instance has left every endpoint.
//!
//! # Components
//!
//! - **`topology`** — instance id → (cluster, container instance)
//! - **`workload`** — running tasks and the services that own them
//! - **`endpoints`** — deduplicated load-balancer / target-group references
//! - **`timing`** — maximum drain timeout across endpoints
//! - **`deregister`** — forced container-instance deregistration
//! - **`orchestrator`** — the run itself, dry-run handling, reporting
//! - **`config`** / **`context`** — run configuration and logging context
//!
//! # Sequence
//!
//! ```text
//! locate ──NotFound──▶ NotInCluster
//!   │
//! tasks_on ──empty──▶ NoTasks
//!   │
//! services_for → Endpoints::collect → max_drain_timeout
//!   │
//! [not dry run] deregister → sleep(timeout)
//!   │
//! HealthPoller::await_drained → Completed(DrainRun)
//! ```

pub mod config;
pub mod context;
pub mod deregister;
pub mod endpoints;
pub mod error;
pub mod orchestrator;
pub mod timing;
pub mod topology;
pub mod workload;

pub use config::{DrainConfig, HealthSettings};
pub use context::DrainContext;
pub use endpoints::Endpoints;
pub use error::{DrainError, DrainResult};
pub use orchestrator::{DrainOrchestrator, DrainOutcome, DrainRun};
pub use topology::Placement;
