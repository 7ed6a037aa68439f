//! In-memory state store for pod lifecycle tests and embedding hosts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::pod::{
    domain::{OverrideStatus, TaskName, TaskRecord, TaskStatus},
    ports::{StateStoreError, StateStoreResult, TaskStateStore},
};

/// Thread-safe in-memory task state store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStateStore {
    state: Arc<RwLock<InMemoryStoreState>>,
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    tasks: Vec<TaskRecord>,
    statuses: Vec<TaskStatus>,
    overrides: HashMap<TaskName, OverrideStatus>,
}

impl InMemoryTaskStateStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a task record.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the store lock is poisoned.
    pub fn put_task(&self, record: TaskRecord) -> StateStoreResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| StateStoreError::persistence(std::io::Error::other(err.to_string())))?;
        state.tasks.push(record);
        Ok(())
    }

    /// Seeds a runtime status, replacing any previous status for the same
    /// task identifier.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the store lock is poisoned.
    pub fn put_status(&self, status: TaskStatus) -> StateStoreResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| StateStoreError::persistence(std::io::Error::other(err.to_string())))?;
        state
            .statuses
            .retain(|existing| existing.task_id() != status.task_id());
        state.statuses.push(status);
        Ok(())
    }

    /// Returns the override status currently recorded for a task, or `None`
    /// when no entry has been written.
    ///
    /// Unlike the port's fetch, absence is surfaced as `None` so tests can
    /// distinguish "never written" from an explicit inactive write.
    #[must_use]
    pub fn override_status_of(&self, task_name: &TaskName) -> Option<OverrideStatus> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.overrides.get(task_name).copied())
    }
}

#[async_trait]
impl TaskStateStore for InMemoryTaskStateStore {
    async fn fetch_tasks(&self) -> StateStoreResult<Vec<TaskRecord>> {
        let state = self
            .state
            .read()
            .map_err(|err| StateStoreError::persistence(std::io::Error::other(err.to_string())))?;
        Ok(state.tasks.clone())
    }

    async fn fetch_statuses(&self) -> StateStoreResult<Vec<TaskStatus>> {
        let state = self
            .state
            .read()
            .map_err(|err| StateStoreError::persistence(std::io::Error::other(err.to_string())))?;
        Ok(state.statuses.clone())
    }

    async fn store_override_status(
        &self,
        task_name: &TaskName,
        status: OverrideStatus,
    ) -> StateStoreResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| StateStoreError::persistence(std::io::Error::other(err.to_string())))?;
        state.overrides.insert(task_name.clone(), status);
        Ok(())
    }

    async fn fetch_override_status(
        &self,
        task_name: &TaskName,
    ) -> StateStoreResult<OverrideStatus> {
        let state = self
            .state
            .read()
            .map_err(|err| StateStoreError::persistence(std::io::Error::other(err.to_string())))?;
        Ok(state
            .overrides
            .get(task_name)
            .copied()
            .unwrap_or(OverrideStatus::INACTIVE))
    }
}
