//! In-memory metadata catalog mapping task names to pod identity and type.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::pod::{
    domain::{PodIdentity, TaskMetadataError, TaskName, TaskRecord},
    ports::{TaskMetadataReader, TaskMetadataResult},
};

/// Thread-safe in-memory metadata catalog.
///
/// Tasks not present in the catalog resolve as metadata-absent, which is
/// how unresolvable tasks are simulated in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadataCatalog {
    state: Arc<RwLock<CatalogState>>,
}

#[derive(Debug, Default)]
struct CatalogState {
    identities: HashMap<TaskName, PodIdentity>,
    task_types: HashMap<TaskName, String>,
}

impl InMemoryMetadataCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a pod identity to the named task.
    ///
    /// # Errors
    ///
    /// Returns a malformed-metadata error when the catalog lock is poisoned.
    pub fn assign_identity(
        &self,
        task_name: &TaskName,
        identity: PodIdentity,
    ) -> TaskMetadataResult<()> {
        let mut state = self.state.write().map_err(|err| poisoned(task_name, &err))?;
        state.identities.insert(task_name.clone(), identity);
        Ok(())
    }

    /// Assigns a task type to the named task.
    ///
    /// # Errors
    ///
    /// Returns a malformed-metadata error when the catalog lock is poisoned.
    pub fn assign_task_type(
        &self,
        task_name: &TaskName,
        task_type: impl Into<String>,
    ) -> TaskMetadataResult<()> {
        let mut state = self.state.write().map_err(|err| poisoned(task_name, &err))?;
        state.task_types.insert(task_name.clone(), task_type.into());
        Ok(())
    }
}

fn poisoned(task_name: &TaskName, err: &impl std::fmt::Display) -> TaskMetadataError {
    TaskMetadataError::Malformed {
        task: task_name.clone(),
        reason: err.to_string(),
    }
}

impl TaskMetadataReader for InMemoryMetadataCatalog {
    fn pod_identity(&self, record: &TaskRecord) -> TaskMetadataResult<PodIdentity> {
        let state = self
            .state
            .read()
            .map_err(|err| poisoned(record.name(), &err))?;
        state
            .identities
            .get(record.name())
            .cloned()
            .ok_or_else(|| TaskMetadataError::MissingPodIdentity(record.name().clone()))
    }

    fn task_type(&self, record: &TaskRecord) -> TaskMetadataResult<String> {
        let state = self
            .state
            .read()
            .map_err(|err| poisoned(record.name(), &err))?;
        state
            .task_types
            .get(record.name())
            .cloned()
            .ok_or_else(|| TaskMetadataError::MissingTaskType(record.name().clone()))
    }
}
