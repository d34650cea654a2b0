//! ecsdrain-health — endpoint health polling for instance drains.
//!
//! Confirms that an instance has stopped receiving traffic from every
//! classic load balancer and target group in front of it. Each attempt
//! queries all endpoints; the poller retries on a fixed interval until an
//! attempt comes back clean or the attempt budget runs out.
//!
//! # Architecture
//!
//! ```text
//! HealthPoller
//!   ├── check_once() → AttemptReport
//!   │   ├── DescribeInstanceHealth per load balancer
//!   │   └── DescribeTargetHealth per target group
//!   ├── complete?  → PollOutcome { drained: true }
//!   └── otherwise sleep(interval), retry up to max_attempts
//! ```
//!
//! Running out of attempts is not an error: the outcome reports
//! `drained: false` and the lifecycle-hook timeout remains the backstop.

pub mod checker;
pub mod poller;

pub use checker::{AttemptReport, EndpointReport, EndpointState, check_once};
pub use poller::{HealthPoller, PollConfig, PollOutcome};
