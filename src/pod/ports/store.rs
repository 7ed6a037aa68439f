//! State store port for task snapshots and persisted override status.

use crate::pod::domain::{OverrideStatus, TaskName, TaskRecord, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for state store operations.
pub type StateStoreResult<T> = Result<T, StateStoreError>;

/// Persisted task state contract.
///
/// The store exclusively owns override-status durability; the lifecycle
/// controller owns only the in-memory sequencing of writes within one
/// request. Override statuses are overwritten, never deleted, and an absent
/// entry is equivalent to [`OverrideStatus::INACTIVE`].
#[async_trait]
pub trait TaskStateStore: Send + Sync {
    /// Fetches a fresh snapshot of every known task record.
    async fn fetch_tasks(&self) -> StateStoreResult<Vec<TaskRecord>>;

    /// Fetches a fresh snapshot of every known runtime status.
    async fn fetch_statuses(&self) -> StateStoreResult<Vec<TaskStatus>>;

    /// Persists the override status for a task, overwriting any previous
    /// value.
    async fn store_override_status(
        &self,
        task_name: &TaskName,
        status: OverrideStatus,
    ) -> StateStoreResult<()>;

    /// Returns the persisted override status for a task.
    ///
    /// Resolves to [`OverrideStatus::INACTIVE`] when no entry exists.
    async fn fetch_override_status(&self, task_name: &TaskName)
    -> StateStoreResult<OverrideStatus>;
}

/// Errors returned by state store implementations.
#[derive(Debug, Clone, Error)]
pub enum StateStoreError {
    /// Persistence-layer failure.
    #[error("state store error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StateStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
