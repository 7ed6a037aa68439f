//! Domain model for pod lifecycle control.
//!
//! The pod domain models grouping of raw task records into pod instances,
//! the goal-state override lifecycle, and status projection, while keeping
//! all infrastructure concerns outside of the domain boundary.

mod error;
mod grouping;
mod ids;
mod override_state;
mod projection;
mod task;

pub use error::{ParseRawTaskStateError, PodDomainError, TaskMetadataError};
pub use grouping::{GroupedTasks, PodTask};
pub use ids::{PodIdentity, TaskId, TaskName};
pub use override_state::{GoalState, GoalStateOverride, OverrideProgress, OverrideStatus};
pub use projection::{display_status, strip_state_prefix};
pub use task::{RawTaskState, RecoveryType, TaskRecord, TaskStatus};
