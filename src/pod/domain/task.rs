//! Task records, raw runtime states, and recovery classification.

use super::{ParseRawTaskStateError, TaskId, TaskName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw task runtime state reported by the cluster resource manager.
///
/// The wire labels are owned by the resource manager and are surfaced
/// verbatim in full-info output; user-facing summaries go through the
/// status projector instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawTaskState {
    /// The task is being provisioned on an agent.
    #[serde(rename = "TASK_STAGING")]
    Staging,
    /// The task is launching.
    #[serde(rename = "TASK_STARTING")]
    Starting,
    /// The task is running.
    #[serde(rename = "TASK_RUNNING")]
    Running,
    /// A kill request has been issued and is in flight.
    #[serde(rename = "TASK_KILLING")]
    Killing,
    /// The task was killed.
    #[serde(rename = "TASK_KILLED")]
    Killed,
    /// The task ran to completion.
    #[serde(rename = "TASK_FINISHED")]
    Finished,
    /// The task terminated with a failure.
    #[serde(rename = "TASK_FAILED")]
    Failed,
    /// The resource manager lost track of the task.
    #[serde(rename = "TASK_LOST")]
    Lost,
    /// The task could not be launched.
    #[serde(rename = "TASK_ERROR")]
    Error,
}

impl RawTaskState {
    /// Returns the canonical wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Staging => "TASK_STAGING",
            Self::Starting => "TASK_STARTING",
            Self::Running => "TASK_RUNNING",
            Self::Killing => "TASK_KILLING",
            Self::Killed => "TASK_KILLED",
            Self::Finished => "TASK_FINISHED",
            Self::Failed => "TASK_FAILED",
            Self::Lost => "TASK_LOST",
            Self::Error => "TASK_ERROR",
        }
    }
}

impl TryFrom<&str> for RawTaskState {
    type Error = ParseRawTaskStateError;

    fn try_from(value: &str) -> Result<Self, ParseRawTaskStateError> {
        match value.trim() {
            "TASK_STAGING" => Ok(Self::Staging),
            "TASK_STARTING" => Ok(Self::Starting),
            "TASK_RUNNING" => Ok(Self::Running),
            "TASK_KILLING" => Ok(Self::Killing),
            "TASK_KILLED" => Ok(Self::Killed),
            "TASK_FINISHED" => Ok(Self::Finished),
            "TASK_FAILED" => Ok(Self::Failed),
            "TASK_LOST" => Ok(Self::Lost),
            "TASK_ERROR" => Ok(Self::Error),
            _ => Err(ParseRawTaskStateError(value.to_owned())),
        }
    }
}

impl fmt::Display for RawTaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable task record fetched from the persisted store.
///
/// Records are snapshots: a fresh set is fetched per operation and never
/// cached across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    id: TaskId,
    name: TaskName,
}

impl TaskRecord {
    /// Creates a task record.
    #[must_use]
    pub const fn new(id: TaskId, name: TaskName) -> Self {
        Self { id, name }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }
}

/// Latest known runtime status for a task.
///
/// Statuses are associated with records by exact identifier match; a task
/// with no matching status is represented as status-absent, not as an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    task_id: TaskId,
    state: RawTaskState,
}

impl TaskStatus {
    /// Creates a task status.
    #[must_use]
    pub const fn new(task_id: TaskId, state: RawTaskState) -> Self {
        Self { task_id, state }
    }

    /// Returns the identifier of the task this status belongs to.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the raw runtime state.
    #[must_use]
    pub const fn state(&self) -> RawTaskState {
        self.state
    }
}

/// How a forcibly restarted task should be relaunched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecoveryType {
    /// Relaunch in place, on the task's current resource placement.
    Transient,
    /// Relaunch on a different resource placement.
    Permanent,
}

impl RecoveryType {
    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "TRANSIENT",
            Self::Permanent => "PERMANENT",
        }
    }
}

impl fmt::Display for RecoveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
