//! Grouping of flat task records into pod instances.

use super::{PodIdentity, TaskId, TaskMetadataError, TaskName, TaskRecord, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// A task record paired with its latest known runtime status, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodTask {
    record: TaskRecord,
    status: Option<TaskStatus>,
}

impl PodTask {
    /// Pairs a record with its status.
    #[must_use]
    pub const fn new(record: TaskRecord, status: Option<TaskStatus>) -> Self {
        Self { record, status }
    }

    /// Returns the task record.
    #[must_use]
    pub const fn record(&self) -> &TaskRecord {
        &self.record
    }

    /// Returns the runtime status, when one was reported.
    #[must_use]
    pub const fn status(&self) -> Option<&TaskStatus> {
        self.status.as_ref()
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        self.record.name()
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        self.record.id()
    }
}

/// Task records grouped into pod instances.
///
/// Grouping is recomputed from a fresh record snapshot on every read; pod
/// instances are never persisted as their own entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedTasks {
    by_pod: BTreeMap<String, Vec<PodTask>>,
    unknown: Vec<PodTask>,
}

impl GroupedTasks {
    /// Groups task records into pod instances using the supplied identity
    /// extractor.
    ///
    /// Statuses are associated with records by exact task-id match; records
    /// with no matching status are kept with an absent status. Tasks whose
    /// pod identity cannot be derived land in the unknown bucket with a
    /// warning; a single unresolvable task never fails the grouping.
    ///
    /// Within each pod, tasks are sorted by name ascending. This ordering is
    /// a contract surface: it determines listing output and kill dispatch
    /// order, and is stable across calls for the same snapshot.
    #[must_use]
    pub fn group<F>(records: Vec<TaskRecord>, statuses: Vec<TaskStatus>, identify: F) -> Self
    where
        F: Fn(&TaskRecord) -> Result<PodIdentity, TaskMetadataError>,
    {
        let mut statuses_by_id: HashMap<TaskId, TaskStatus> = statuses
            .into_iter()
            .map(|status| (status.task_id().clone(), status))
            .collect();

        let mut by_pod: BTreeMap<String, Vec<PodTask>> = BTreeMap::new();
        let mut unknown = Vec::new();
        for record in records {
            let status = statuses_by_id.remove(record.id());
            match identify(&record) {
                Ok(identity) => {
                    by_pod
                        .entry(identity.name())
                        .or_default()
                        .push(PodTask::new(record, status));
                }
                Err(reason) => {
                    warn!(
                        task = %record.name(),
                        %reason,
                        "could not derive pod identity, routing task to the unknown bucket"
                    );
                    unknown.push(PodTask::new(record, status));
                }
            }
        }

        for tasks in by_pod.values_mut() {
            tasks.sort_by(|a, b| a.name().cmp(b.name()));
        }

        Self { by_pod, unknown }
    }

    /// Returns the tasks of the named pod, or `None` when the pod is not
    /// present in this grouping.
    #[must_use]
    pub fn pod(&self, name: &str) -> Option<&[PodTask]> {
        self.by_pod.get(name).map(Vec::as_slice)
    }

    /// Returns all pods keyed by name, in sorted name order.
    #[must_use]
    pub const fn by_pod(&self) -> &BTreeMap<String, Vec<PodTask>> {
        &self.by_pod
    }

    /// Returns the tasks whose pod identity could not be derived.
    #[must_use]
    pub fn unknown(&self) -> &[PodTask] {
        &self.unknown
    }
}
