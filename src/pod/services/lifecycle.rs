//! Service layer orchestrating pod stop/start/restart/replace operations.

use crate::pod::{
    domain::{
        GoalStateOverride, GroupedTasks, OverrideProgress, OverrideStatus, PodTask, RawTaskState,
        RecoveryType, TaskId, TaskName, display_status,
    },
    ports::{StateStoreError, TaskKiller, TaskMetadataReader, TaskStateStore},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Pod name used in listings for tasks with no resolvable pod identity.
pub const UNKNOWN_POD_LABEL: &str = "UNKNOWN_POD";

/// Set of short task names restricting a stop/start request to a subset of
/// a pod's tasks.
///
/// Short names are qualified with the pod name at resolution time, so a
/// filter of `{"server"}` against pod `pod-0` selects task `pod-0-server`.
/// An empty filter selects every task in the pod.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    names: BTreeSet<String>,
}

impl TaskFilter {
    /// Creates a filter from short task names.
    #[must_use]
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// Creates the empty filter, which selects every task in the pod.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    /// Parses a filter from a request body payload.
    ///
    /// A blank payload parses to the empty filter. Otherwise the payload
    /// must be a JSON array; each element is taken as a short task name,
    /// with non-string scalars coerced to their textual form.
    ///
    /// # Errors
    ///
    /// Returns [`TaskFilterError`] when the payload is not valid JSON or is
    /// not an array.
    pub fn parse_json(payload: &str) -> Result<Self, TaskFilterError> {
        let trimmed = payload.trim();
        if trimmed.is_empty() {
            return Ok(Self::empty());
        }
        let values: Vec<serde_json::Value> =
            serde_json::from_str(trimmed).map_err(|err| TaskFilterError {
                payload: payload.to_owned(),
                reason: err.to_string(),
            })?;
        Ok(Self::new(values.into_iter().map(|value| match value {
            serde_json::Value::String(name) => name,
            other => other.to_string(),
        })))
    }

    /// Returns whether the filter selects every task.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the number of short names in the filter.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Qualifies each short name into a full task name using the pod name
    /// as prefix.
    fn qualified(&self, pod_name: &str) -> BTreeSet<String> {
        self.names
            .iter()
            .map(|name| format!("{pod_name}-{name}"))
            .collect()
    }
}

/// Error for a task filter payload that could not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed task filter payload '{payload}': {reason}")]
pub struct TaskFilterError {
    /// The rejected payload.
    pub payload: String,
    /// Description of the parse failure.
    pub reason: String,
}

/// Outcome of a mutating pod operation: the pod acted on and the tasks
/// affected, in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodCommandReceipt {
    /// Name of the pod operated on.
    pub pod: String,
    /// Names of the tasks affected, in dispatch order.
    pub tasks: Vec<TaskName>,
}

/// User-facing status summary for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatusSummary {
    /// Task identifier.
    pub id: TaskId,
    /// Task name.
    pub name: TaskName,
    /// Raw runtime state, when a status is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RawTaskState>,
    /// Projected display status, when a status is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Task type from scheduler metadata; omitted when unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub task_type: Option<String>,
}

/// Service-level errors for pod lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum PodLifecycleError {
    /// The task filter payload could not be parsed.
    #[error(transparent)]
    InvalidFilter(#[from] TaskFilterError),

    /// The pod is not present in the current grouping.
    #[error("pod not found: {0}")]
    PodNotFound(String),

    /// One or more filtered task names did not resolve to tasks in the pod.
    #[error("tasks not found in pod {pod}: {requested:?}")]
    TasksNotFound {
        /// Name of the pod the filter was resolved against.
        pod: String,
        /// Qualified task names requested by the filter.
        requested: Vec<String>,
    },

    /// The task kill capability has not been wired up yet.
    #[error("task kill capability is not available yet, try again later")]
    KillerUnavailable,

    /// State store I/O failed; the operation may have partially mutated
    /// per-task state.
    #[error(transparent)]
    Store(#[from] StateStoreError),
}

/// Result type for pod lifecycle service operations.
pub type PodLifecycleResult<T> = Result<T, PodLifecycleError>;

/// Pod lifecycle orchestration service.
///
/// Fetches a fresh task snapshot from the store for every operation and
/// never caches groupings across requests. The kill capability is an
/// optional dependency: until it is wired up, mutating operations return
/// [`PodLifecycleError::KillerUnavailable`] before any state is written.
///
/// Operations provide no cross-task atomicity. Concurrent calls against
/// the same pod may interleave their store writes and kill dispatches;
/// callers needing exclusivity must serialize above this service.
#[derive(Clone)]
pub struct PodLifecycleService<S, K, M>
where
    S: TaskStateStore,
    K: TaskKiller,
    M: TaskMetadataReader,
{
    store: Arc<S>,
    metadata: Arc<M>,
    killer: Option<Arc<K>>,
}

impl<S, K, M> PodLifecycleService<S, K, M>
where
    S: TaskStateStore,
    K: TaskKiller,
    M: TaskMetadataReader,
{
    /// Creates a new pod lifecycle service.
    ///
    /// Pass `None` for the killer while the kill capability is still being
    /// wired up; mutating operations stay unavailable until then.
    #[must_use]
    pub const fn new(store: Arc<S>, metadata: Arc<M>, killer: Option<Arc<K>>) -> Self {
        Self {
            store,
            metadata,
            killer,
        }
    }

    async fn grouped_snapshot(&self) -> PodLifecycleResult<GroupedTasks> {
        let records = self.store.fetch_tasks().await?;
        let statuses = self.store.fetch_statuses().await?;
        Ok(GroupedTasks::group(records, statuses, |record| {
            self.metadata.pod_identity(record)
        }))
    }

    fn checked_killer(&self) -> PodLifecycleResult<&Arc<K>> {
        self.killer.as_ref().map_or_else(
            || {
                error!("task kill capability not wired up yet, exiting early");
                Err(PodLifecycleError::KillerUnavailable)
            },
            Ok,
        )
    }

    /// Lists all pod instance names, sorted, followed by a synthesized
    /// `UNKNOWN_POD_<taskname>` entry per unresolvable task.
    ///
    /// # Errors
    ///
    /// Returns [`PodLifecycleError::Store`] when the snapshot fetch fails.
    pub async fn list_pods(&self) -> PodLifecycleResult<Vec<String>> {
        let grouped = self.grouped_snapshot().await?;
        let mut names: Vec<String> = grouped.by_pod().keys().cloned().collect();
        let mut unknown: Vec<String> = grouped
            .unknown()
            .iter()
            .map(|task| format!("{UNKNOWN_POD_LABEL}_{}", task.name()))
            .collect();
        unknown.sort();
        names.extend(unknown);
        Ok(names)
    }

    /// Returns status summaries for every pod, keyed by pod name, with an
    /// `UNKNOWN_POD` bucket when any task lacks a resolvable pod identity.
    ///
    /// # Errors
    ///
    /// Returns [`PodLifecycleError::Store`] when snapshot or override
    /// fetches fail.
    pub async fn all_pod_statuses(
        &self,
    ) -> PodLifecycleResult<BTreeMap<String, Vec<TaskStatusSummary>>> {
        let grouped = self.grouped_snapshot().await?;
        let mut report = BTreeMap::new();
        for (pod_name, tasks) in grouped.by_pod() {
            report.insert(pod_name.clone(), self.summaries(tasks).await?);
        }
        if !grouped.unknown().is_empty() {
            report.insert(
                UNKNOWN_POD_LABEL.to_owned(),
                self.summaries(grouped.unknown()).await?,
            );
        }
        Ok(report)
    }

    /// Returns status summaries for one pod's tasks, in task name order.
    ///
    /// # Errors
    ///
    /// Returns [`PodLifecycleError::PodNotFound`] when the pod is absent
    /// from the grouping, or [`PodLifecycleError::Store`] on I/O failure.
    pub async fn pod_status(&self, pod_name: &str) -> PodLifecycleResult<Vec<TaskStatusSummary>> {
        let grouped = self.grouped_snapshot().await?;
        let tasks = pod_or_not_found(&grouped, pod_name)?;
        self.summaries(tasks).await
    }

    /// Returns the full task records for one pod, in task name order.
    ///
    /// # Errors
    ///
    /// Returns [`PodLifecycleError::PodNotFound`] when the pod is absent
    /// from the grouping, or [`PodLifecycleError::Store`] on I/O failure.
    pub async fn pod_info(&self, pod_name: &str) -> PodLifecycleResult<Vec<PodTask>> {
        let grouped = self.grouped_snapshot().await?;
        let tasks = pod_or_not_found(&grouped, pod_name)?;
        Ok(tasks.to_vec())
    }

    /// Applies a goal-state override to a pod, optionally restricted to a
    /// task subset.
    ///
    /// Validates the pod and the full filter before any mutation. The
    /// first pass records `(target, Pending)` for every qualifying task;
    /// the second pass, in task name order, dispatches a transient-recovery
    /// kill per task and advances its recorded status to
    /// `(target, InProgress)`. Per-task pairs are independent: a failed
    /// kill dispatch is logged and skipped without blocking siblings, and
    /// nothing is rolled back. The external reconciliation process owns
    /// the eventual `Complete` transition.
    ///
    /// # Errors
    ///
    /// Returns [`PodLifecycleError::PodNotFound`] for an unknown or empty
    /// pod, [`PodLifecycleError::TasksNotFound`] when filter entries do not
    /// resolve, [`PodLifecycleError::KillerUnavailable`] while the kill
    /// capability is absent (all three before any write), and
    /// [`PodLifecycleError::Store`] on I/O failure mid-sequence.
    pub async fn apply_override(
        &self,
        pod_name: &str,
        filter: &TaskFilter,
        target: GoalStateOverride,
    ) -> PodLifecycleResult<PodCommandReceipt> {
        let grouped = self.grouped_snapshot().await?;
        let pod_tasks = pod_or_not_found(&grouped, pod_name)?;
        let selected = select_tasks(pod_name, pod_tasks, filter)?;
        let killer = self.checked_killer()?;

        info!(
            pod = pod_name,
            target = %target,
            tasks = selected.len(),
            "applying goal-state override"
        );

        // First pass: record operator intent for every task before any
        // termination begins.
        let pending = target.status(OverrideProgress::Pending);
        for task in &selected {
            self.store.store_override_status(task.name(), pending).await?;
        }

        // Second pass: kill each task and advance its recorded status.
        let in_progress = pending.with_progress(OverrideProgress::InProgress);
        let affected = self
            .kill_tasks(
                killer.as_ref(),
                &selected,
                RecoveryType::Transient,
                Some(in_progress),
            )
            .await?;
        Ok(PodCommandReceipt {
            pod: pod_name.to_owned(),
            tasks: affected,
        })
    }

    /// Forcibly restarts every task in a pod with the given recovery type.
    ///
    /// Orthogonal to the override mechanism: no override status is read or
    /// written, so a pod may be force-recovered while an override is in
    /// flight.
    ///
    /// # Errors
    ///
    /// Returns [`PodLifecycleError::PodNotFound`] for an unknown or empty
    /// pod and [`PodLifecycleError::KillerUnavailable`] while the kill
    /// capability is absent, both before any dispatch.
    pub async fn force_recovery(
        &self,
        pod_name: &str,
        recovery: RecoveryType,
    ) -> PodLifecycleResult<PodCommandReceipt> {
        let grouped = self.grouped_snapshot().await?;
        let pod_tasks = pod_or_not_found(&grouped, pod_name)?;
        let killer = self.checked_killer()?;

        info!(
            pod = pod_name,
            recovery = %recovery,
            tasks = pod_tasks.len(),
            "force-recovering pod"
        );

        let selected: Vec<&PodTask> = pod_tasks.iter().collect();
        let affected = self
            .kill_tasks(killer.as_ref(), &selected, recovery, None)
            .await?;
        Ok(PodCommandReceipt {
            pod: pod_name.to_owned(),
            tasks: affected,
        })
    }

    /// Stops a pod (or a task subset) into the stopped debug mode.
    ///
    /// # Errors
    ///
    /// As [`Self::apply_override`].
    pub async fn stop(
        &self,
        pod_name: &str,
        filter: &TaskFilter,
    ) -> PodLifecycleResult<PodCommandReceipt> {
        self.apply_override(pod_name, filter, GoalStateOverride::Stopped)
            .await
    }

    /// Returns a pod (or a task subset) to its configured goal state after
    /// a prior stop.
    ///
    /// # Errors
    ///
    /// As [`Self::apply_override`].
    pub async fn start(
        &self,
        pod_name: &str,
        filter: &TaskFilter,
    ) -> PodLifecycleResult<PodCommandReceipt> {
        self.apply_override(pod_name, filter, GoalStateOverride::None)
            .await
    }

    /// Restarts a pod in place.
    ///
    /// # Errors
    ///
    /// As [`Self::force_recovery`].
    pub async fn restart(&self, pod_name: &str) -> PodLifecycleResult<PodCommandReceipt> {
        self.force_recovery(pod_name, RecoveryType::Transient).await
    }

    /// Replaces a pod on a different resource placement.
    ///
    /// # Errors
    ///
    /// As [`Self::force_recovery`].
    pub async fn replace(&self, pod_name: &str) -> PodLifecycleResult<PodCommandReceipt> {
        self.force_recovery(pod_name, RecoveryType::Permanent).await
    }

    /// Dispatches kills for the given tasks in order, optionally recording
    /// a follow-up override status after each successful dispatch.
    ///
    /// A failed dispatch is logged and excluded from the affected set; the
    /// remaining tasks still proceed. Store failures propagate.
    async fn kill_tasks(
        &self,
        killer: &K,
        tasks: &[&PodTask],
        recovery: RecoveryType,
        follow_up: Option<OverrideStatus>,
    ) -> PodLifecycleResult<Vec<TaskName>> {
        let mut affected = Vec::with_capacity(tasks.len());
        for task in tasks {
            let state_label = task
                .status()
                .map_or("<none>", |status| status.state().as_str());
            info!(
                task = %task.name(),
                id = %task.id(),
                state = state_label,
                recovery = %recovery,
                "dispatching task kill"
            );
            if let Err(err) = killer.kill_task(task.id(), recovery).await {
                error!(
                    task = %task.name(),
                    error = %err,
                    "kill dispatch failed, continuing with remaining tasks"
                );
                continue;
            }
            if let Some(status) = follow_up {
                self.store.store_override_status(task.name(), status).await?;
            }
            affected.push(task.name().clone());
        }
        Ok(affected)
    }

    /// Builds status summaries for a task list, consulting the persisted
    /// override status for each task with a known runtime state.
    async fn summaries(&self, tasks: &[PodTask]) -> PodLifecycleResult<Vec<TaskStatusSummary>> {
        let mut out = Vec::with_capacity(tasks.len());
        for task in tasks {
            let (state, status) = match task.status() {
                Some(task_status) => {
                    let override_status =
                        self.store.fetch_override_status(task.name()).await?;
                    (
                        Some(task_status.state()),
                        Some(display_status(task_status.state(), override_status)),
                    )
                }
                None => (None, None),
            };
            out.push(TaskStatusSummary {
                id: task.id().clone(),
                name: task.name().clone(),
                state,
                status,
                task_type: self.metadata.task_type(task.record()).ok(),
            });
        }
        Ok(out)
    }
}

/// Looks up a pod in the grouping, treating absence and emptiness alike as
/// not found.
fn pod_or_not_found<'a>(
    grouped: &'a GroupedTasks,
    pod_name: &str,
) -> PodLifecycleResult<&'a [PodTask]> {
    grouped
        .pod(pod_name)
        .filter(|tasks| !tasks.is_empty())
        .ok_or_else(|| PodLifecycleError::PodNotFound(pod_name.to_owned()))
}

/// Resolves the task filter against a pod's tasks.
///
/// Every filter entry must resolve to a real task; otherwise the request
/// fails before any state is mutated.
fn select_tasks<'a>(
    pod_name: &str,
    pod_tasks: &'a [PodTask],
    filter: &TaskFilter,
) -> PodLifecycleResult<Vec<&'a PodTask>> {
    if filter.is_empty() {
        return Ok(pod_tasks.iter().collect());
    }
    let qualified = filter.qualified(pod_name);
    let selected: Vec<&PodTask> = pod_tasks
        .iter()
        .filter(|task| qualified.contains(task.name().as_str()))
        .collect();
    if selected.len() < filter.len() {
        warn!(
            pod = pod_name,
            requested = ?qualified,
            matched = selected.len(),
            "task filter references tasks the pod does not contain"
        );
        return Err(PodLifecycleError::TasksNotFound {
            pod: pod_name.to_owned(),
            requested: qualified.into_iter().collect(),
        });
    }
    Ok(selected)
}
