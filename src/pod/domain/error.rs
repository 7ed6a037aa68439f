//! Error types for pod domain validation and parsing.

use super::TaskName;
use thiserror::Error;

/// Errors returned while constructing domain pod values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PodDomainError {
    /// The task identifier is empty after trimming.
    #[error("task identifier must not be empty")]
    EmptyTaskId,

    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// The pod type is empty or contains whitespace.
    #[error("invalid pod type '{0}', expected a non-empty whitespace-free value")]
    InvalidPodType(String),
}

/// Error returned while parsing raw runtime states from the resource manager.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task state: {0}")]
pub struct ParseRawTaskStateError(pub String);

/// Errors returned by task metadata lookups.
///
/// Absent or malformed metadata is an expected outcome for tasks launched
/// outside this scheduler's conventions; callers treat these as normal
/// branches rather than faults.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskMetadataError {
    /// The task carries no resolvable pod identity.
    #[error("task {0} carries no resolvable pod identity")]
    MissingPodIdentity(TaskName),

    /// The task carries no task type.
    #[error("task {0} carries no task type")]
    MissingTaskType(TaskName),

    /// The task metadata is present but cannot be decoded.
    #[error("malformed metadata for task {task}: {reason}")]
    Malformed {
        /// Name of the task whose metadata failed to decode.
        task: TaskName,
        /// Description of the decoding failure.
        reason: String,
    },
}
