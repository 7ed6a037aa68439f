//! Metadata reader port for deriving pod identity and task type.

use crate::pod::domain::{PodIdentity, TaskMetadataError, TaskRecord};

/// Result type for task metadata lookups.
pub type TaskMetadataResult<T> = Result<T, TaskMetadataError>;

/// Decodes scheduler metadata attached to task records.
///
/// The metadata encoding itself is owned by the launch path and is opaque
/// to this crate. Absent metadata is an expected outcome: grouping routes
/// such tasks to the unknown bucket and status summaries omit the task
/// type, neither of which is an error.
pub trait TaskMetadataReader: Send + Sync {
    /// Derives the pod identity (pod type and instance index) for a task.
    fn pod_identity(&self, record: &TaskRecord) -> TaskMetadataResult<PodIdentity>;

    /// Derives the task type for a task.
    fn task_type(&self, record: &TaskRecord) -> TaskMetadataResult<String>;
}
