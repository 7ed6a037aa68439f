//! Task kill port for dispatching terminations to the resource manager.

use crate::pod::domain::{RecoveryType, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task kill operations.
pub type TaskKillResult<T> = Result<T, TaskKillError>;

/// Task termination contract.
///
/// Implementations issue a termination request against the underlying
/// resource manager; the recovery type tells the recovery machinery whether
/// the task should relaunch in place or on a different placement. Dispatch
/// is best-effort: completion of the termination is observed by the
/// external reconciliation process, not by callers of this port.
#[async_trait]
pub trait TaskKiller: Send + Sync {
    /// Dispatches a termination request for the identified task.
    async fn kill_task(&self, task_id: &TaskId, recovery: RecoveryType) -> TaskKillResult<()>;
}

/// Errors returned by task killer implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskKillError {
    /// The termination request could not be dispatched.
    #[error("kill dispatch error: {0}")]
    Dispatch(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskKillError {
    /// Wraps a dispatch error.
    pub fn dispatch(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Dispatch(Arc::new(err))
    }
}
