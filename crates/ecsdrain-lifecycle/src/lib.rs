//! ecsdrain-lifecycle — autoscaling lifecycle event handling.
//!
//! Bridges a scale-down lifecycle notification to a drain run. The handler
//! decodes the event, drains the instance, then tells the autoscaling
//! group it may continue terminating.
//!
//! # Flow
//!
//! ```text
//! SNS envelope / bare message
//!   │
//!   ▼
//! decode() → LifecycleEvent
//!   ├── Test        → acknowledged, nothing drained
//!   ├── Other       → skipped
//!   └── Terminating → DrainOrchestrator::run()
//!                       ├── Ok  → complete_lifecycle_action(CONTINUE)
//!                       └── Err → propagated, action left pending
//! ```
//!
//! In dry-run mode the drain runs read-only and the lifecycle action is
//! not completed.

pub mod error;
pub mod event;
pub mod handler;

pub use error::{LifecycleError, LifecycleResult};
pub use event::{LifecycleEvent, LifecycleMessage, TerminationNotice, decode};
pub use handler::{HandlerOutcome, LifecycleHandler};
