//! Service orchestration tests for pod lifecycle operations.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use eyre::ensure;
use mockall::mock;
use rstest::{fixture, rstest};

use crate::pod::{
    adapters::{InMemoryMetadataCatalog, InMemoryTaskStateStore, RecordingTaskKiller},
    domain::{
        GoalStateOverride, OverrideProgress, OverrideStatus, PodIdentity, RawTaskState,
        RecoveryType, TaskId, TaskName, TaskRecord, TaskStatus,
    },
    ports::{TaskKillError, TaskKillResult, TaskKiller},
    services::{PodLifecycleError, PodLifecycleService, TaskFilter},
};

type TestService =
    PodLifecycleService<InMemoryTaskStateStore, RecordingTaskKiller, InMemoryMetadataCatalog>;

struct Harness {
    store: Arc<InMemoryTaskStateStore>,
    metadata: Arc<InMemoryMetadataCatalog>,
    killer: Arc<RecordingTaskKiller>,
    service: TestService,
    task_a: SeededTask,
    task_b: SeededTask,
}

struct SeededTask {
    id: TaskId,
    name: TaskName,
}

fn seed_task(
    store: &InMemoryTaskStateStore,
    metadata: &InMemoryMetadataCatalog,
    identity: &PodIdentity,
    short: &str,
    state: Option<RawTaskState>,
) -> eyre::Result<SeededTask> {
    let name = TaskName::new(format!("{}-{short}", identity.name()))?;
    let id = TaskId::generate(&name);
    metadata.assign_identity(&name, identity.clone())?;
    if let Some(state) = state {
        store.put_status(TaskStatus::new(id.clone(), state))?;
    }
    store.put_task(TaskRecord::new(id.clone(), name.clone()))?;
    Ok(SeededTask { id, name })
}

/// Harness with pod `pod-0` holding running tasks `pod-0-a` and `pod-0-b`,
/// seeded out of name order to exercise sorting.
#[fixture]
fn harness() -> eyre::Result<Harness> {
    let store = Arc::new(InMemoryTaskStateStore::new());
    let metadata = Arc::new(InMemoryMetadataCatalog::new());
    let killer = Arc::new(RecordingTaskKiller::new());
    let identity = PodIdentity::new("pod", 0)?;
    let task_b = seed_task(&store, &metadata, &identity, "b", Some(RawTaskState::Running))?;
    let task_a = seed_task(&store, &metadata, &identity, "a", Some(RawTaskState::Running))?;
    let service =
        PodLifecycleService::new(store.clone(), metadata.clone(), Some(killer.clone()));
    Ok(Harness {
        store,
        metadata,
        killer,
        service,
        task_a,
        task_b,
    })
}

fn short_filter(short: &str) -> TaskFilter {
    TaskFilter::new([short.to_owned()])
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_pods_appends_unknown_tasks_after_known_pods(
    harness: eyre::Result<Harness>,
) -> eyre::Result<()> {
    let ctx = harness?;
    // A task without resolvable identity, sorting before "pod-0" by name.
    let stray_name = TaskName::new("aardvark")?;
    ctx.store.put_task(TaskRecord::new(
        TaskId::generate(&stray_name),
        stray_name,
    ))?;

    let pods = ctx.service.list_pods().await?;

    assert_eq!(pods, vec!["pod-0", "UNKNOWN_POD_aardvark"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn read_operations_return_not_found_for_unknown_pods(
    harness: eyre::Result<Harness>,
) -> eyre::Result<()> {
    let ctx = harness?;

    let status = ctx.service.pod_status("pod-9").await;
    let info = ctx.service.pod_info("pod-9").await;

    ensure!(matches!(status, Err(PodLifecycleError::PodNotFound(_))));
    ensure!(matches!(info, Err(PodLifecycleError::PodNotFound(_))));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mutating_operations_on_unknown_pods_touch_nothing(
    harness: eyre::Result<Harness>,
) -> eyre::Result<()> {
    let ctx = harness?;

    let stop = ctx.service.stop("pod-9", &TaskFilter::empty()).await;
    let restart = ctx.service.restart("pod-9").await;

    ensure!(matches!(stop, Err(PodLifecycleError::PodNotFound(_))));
    ensure!(matches!(restart, Err(PodLifecycleError::PodNotFound(_))));
    ensure!(ctx.killer.kills()?.is_empty());
    ensure!(ctx.store.override_status_of(&ctx.task_a.name).is_none());
    ensure!(ctx.store.override_status_of(&ctx.task_b.name).is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pod_info_lists_tasks_in_name_order(harness: eyre::Result<Harness>) -> eyre::Result<()> {
    let ctx = harness?;

    let info = ctx.service.pod_info("pod-0").await?;

    let names: Vec<&str> = info.iter().map(|task| task.name().as_str()).collect();
    assert_eq!(names, vec!["pod-0-a", "pod-0-b"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_with_filter_targets_only_the_requested_task(
    harness: eyre::Result<Harness>,
) -> eyre::Result<()> {
    let ctx = harness?;

    let receipt = ctx.service.stop("pod-0", &short_filter("a")).await?;

    assert_eq!(receipt.pod, "pod-0");
    assert_eq!(receipt.tasks, vec![ctx.task_a.name.clone()]);
    assert_eq!(
        ctx.killer.kills()?,
        vec![(ctx.task_a.id.clone(), RecoveryType::Transient)]
    );
    assert_eq!(
        ctx.store.override_status_of(&ctx.task_a.name),
        Some(OverrideStatus::new(
            GoalStateOverride::Stopped,
            OverrideProgress::InProgress
        ))
    );
    ensure!(ctx.store.override_status_of(&ctx.task_b.name).is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_with_unmatched_filter_mutates_nothing(
    harness: eyre::Result<Harness>,
) -> eyre::Result<()> {
    let ctx = harness?;

    let result = ctx.service.stop("pod-0", &short_filter("z")).await;

    ensure!(matches!(
        result,
        Err(PodLifecycleError::TasksNotFound { .. })
    ));
    ensure!(ctx.killer.kills()?.is_empty());
    ensure!(ctx.store.override_status_of(&ctx.task_a.name).is_none());
    ensure!(ctx.store.override_status_of(&ctx.task_b.name).is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mutating_operations_without_killer_return_unavailable(
    harness: eyre::Result<Harness>,
) -> eyre::Result<()> {
    let ctx = harness?;
    let service: TestService =
        PodLifecycleService::new(ctx.store.clone(), ctx.metadata.clone(), None);

    let stop = service.stop("pod-0", &TaskFilter::empty()).await;
    let start = service.start("pod-0", &TaskFilter::empty()).await;
    let restart = service.restart("pod-0").await;
    let replace = service.replace("pod-0").await;

    for result in [stop, start, restart, replace] {
        ensure!(matches!(
            result,
            Err(PodLifecycleError::KillerUnavailable)
        ));
    }
    ensure!(ctx.store.override_status_of(&ctx.task_a.name).is_none());
    ensure!(ctx.store.override_status_of(&ctx.task_b.name).is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_records_pending_for_all_tasks_before_any_kill(
    harness: eyre::Result<Harness>,
) -> eyre::Result<()> {
    let ctx = harness?;
    // Watch the LAST task in sort order: when the first kill fires, its
    // pending status must already be recorded.
    let probe = Arc::new(StatusProbeKiller::watching(
        ctx.store.clone(),
        ctx.task_b.name.clone(),
    ));
    let service = PodLifecycleService::new(
        ctx.store.clone(),
        ctx.metadata.clone(),
        Some(probe.clone()),
    );

    service.stop("pod-0", &TaskFilter::empty()).await?;

    let pending = GoalStateOverride::Stopped.status(OverrideProgress::Pending);
    let seen = probe.seen()?;
    assert_eq!(seen.len(), 2);
    ensure!(seen.iter().all(|status| *status == Some(pending)));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restart_kills_every_task_in_sorted_order_without_override_writes(
    harness: eyre::Result<Harness>,
) -> eyre::Result<()> {
    let ctx = harness?;

    let receipt = ctx.service.restart("pod-0").await?;

    assert_eq!(
        receipt.tasks,
        vec![ctx.task_a.name.clone(), ctx.task_b.name.clone()]
    );
    assert_eq!(
        ctx.killer.kills()?,
        vec![
            (ctx.task_a.id.clone(), RecoveryType::Transient),
            (ctx.task_b.id.clone(), RecoveryType::Transient),
        ]
    );
    ensure!(ctx.store.override_status_of(&ctx.task_a.name).is_none());
    ensure!(ctx.store.override_status_of(&ctx.task_b.name).is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replace_dispatches_permanent_recovery(
    harness: eyre::Result<Harness>,
) -> eyre::Result<()> {
    let ctx = harness?;

    let receipt = ctx.service.replace("pod-0").await?;

    assert_eq!(receipt.tasks.len(), 2);
    let kills = ctx.killer.kills()?;
    ensure!(kills
        .iter()
        .all(|(_, recovery)| *recovery == RecoveryType::Permanent));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_stop_is_idempotent(harness: eyre::Result<Harness>) -> eyre::Result<()> {
    let ctx = harness?;

    let first = ctx.service.stop("pod-0", &TaskFilter::empty()).await?;
    let second = ctx.service.stop("pod-0", &TaskFilter::empty()).await?;

    assert_eq!(first, second);
    let in_progress = GoalStateOverride::Stopped.status(OverrideProgress::InProgress);
    assert_eq!(
        ctx.store.override_status_of(&ctx.task_a.name),
        Some(in_progress)
    );
    assert_eq!(
        ctx.store.override_status_of(&ctx.task_b.name),
        Some(in_progress)
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_after_stop_records_the_no_override_target(
    harness: eyre::Result<Harness>,
) -> eyre::Result<()> {
    let ctx = harness?;
    ctx.service.stop("pod-0", &TaskFilter::empty()).await?;

    ctx.service.start("pod-0", &TaskFilter::empty()).await?;

    let clearing = GoalStateOverride::None.status(OverrideProgress::InProgress);
    assert_eq!(
        ctx.store.override_status_of(&ctx.task_a.name),
        Some(clearing)
    );
    // Clearing an override is itself an active override transition until
    // the reconciliation process settles it.
    ensure!(clearing.is_active());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn kill_dispatch_failure_does_not_block_siblings(
    harness: eyre::Result<Harness>,
) -> eyre::Result<()> {
    let ctx = harness?;
    let failing_id = ctx.task_a.id.clone();
    let mut killer = MockKiller::new();
    killer
        .expect_kill_task()
        .times(2)
        .returning(move |task_id, _| {
            if *task_id == failing_id {
                Err(TaskKillError::dispatch(std::io::Error::other(
                    "dispatch refused",
                )))
            } else {
                Ok(())
            }
        });
    let service = PodLifecycleService::new(
        ctx.store.clone(),
        ctx.metadata.clone(),
        Some(Arc::new(killer)),
    );

    let receipt = service.stop("pod-0", &TaskFilter::empty()).await?;

    assert_eq!(receipt.tasks, vec![ctx.task_b.name.clone()]);
    // The failed task keeps its recorded intent for the reconciler.
    assert_eq!(
        ctx.store.override_status_of(&ctx.task_a.name),
        Some(GoalStateOverride::Stopped.status(OverrideProgress::Pending))
    );
    assert_eq!(
        ctx.store.override_status_of(&ctx.task_b.name),
        Some(GoalStateOverride::Stopped.status(OverrideProgress::InProgress))
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pod_status_projects_overrides_and_omits_missing_metadata(
    harness: eyre::Result<Harness>,
) -> eyre::Result<()> {
    let ctx = harness?;
    ctx.metadata
        .assign_task_type(&ctx.task_a.name, "server")?;
    ctx.service.stop("pod-0", &short_filter("a")).await?;

    let summaries = ctx.service.pod_status("pod-0").await?;

    let first = summaries
        .first()
        .ok_or_else(|| eyre::eyre!("expected two summaries"))?;
    let second = summaries
        .get(1)
        .ok_or_else(|| eyre::eyre!("expected two summaries"))?;
    assert_eq!(first.state, Some(RawTaskState::Running));
    assert_eq!(first.status.as_deref(), Some("STOPPED"));
    assert_eq!(first.task_type.as_deref(), Some("server"));
    assert_eq!(second.status.as_deref(), Some("RUNNING"));
    ensure!(second.task_type.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_absent_tasks_summarize_without_state(
    harness: eyre::Result<Harness>,
) -> eyre::Result<()> {
    let ctx = harness?;
    let identity = PodIdentity::new("pod", 0)?;
    let silent = seed_task(&ctx.store, &ctx.metadata, &identity, "c", None)?;

    let summaries = ctx.service.pod_status("pod-0").await?;

    let last = summaries
        .iter()
        .find(|summary| summary.name == silent.name)
        .ok_or_else(|| eyre::eyre!("expected the silent task"))?;
    ensure!(last.state.is_none());
    ensure!(last.status.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn all_pod_statuses_includes_an_unknown_bucket(
    harness: eyre::Result<Harness>,
) -> eyre::Result<()> {
    let ctx = harness?;
    let stray_name = TaskName::new("stray-task")?;
    let stray_id = TaskId::generate(&stray_name);
    ctx.store
        .put_status(TaskStatus::new(stray_id.clone(), RawTaskState::Failed))?;
    ctx.store
        .put_task(TaskRecord::new(stray_id, stray_name.clone()))?;

    let report = ctx.service.all_pod_statuses().await?;

    let pod_names: Vec<&String> = report.keys().collect();
    assert_eq!(pod_names, vec!["UNKNOWN_POD", "pod-0"]);
    let unknown = report
        .get("UNKNOWN_POD")
        .ok_or_else(|| eyre::eyre!("expected the unknown bucket"))?;
    let stray = unknown
        .first()
        .ok_or_else(|| eyre::eyre!("expected the stray task"))?;
    assert_eq!(stray.name, stray_name);
    assert_eq!(stray.status.as_deref(), Some("FAILED"));
    Ok(())
}

/// Task killer probe that snapshots a watched task's recorded override
/// status at each dispatch.
struct StatusProbeKiller {
    store: Arc<InMemoryTaskStateStore>,
    watched: TaskName,
    seen: RwLock<Vec<Option<OverrideStatus>>>,
}

impl StatusProbeKiller {
    fn watching(store: Arc<InMemoryTaskStateStore>, watched: TaskName) -> Self {
        Self {
            store,
            watched,
            seen: RwLock::new(Vec::new()),
        }
    }

    fn seen(&self) -> eyre::Result<Vec<Option<OverrideStatus>>> {
        self.seen
            .read()
            .map(|seen| seen.clone())
            .map_err(|err| eyre::eyre!("probe lock poisoned: {err}"))
    }
}

#[async_trait]
impl TaskKiller for StatusProbeKiller {
    async fn kill_task(&self, _task_id: &TaskId, _recovery: RecoveryType) -> TaskKillResult<()> {
        let snapshot = self.store.override_status_of(&self.watched);
        let mut seen = self
            .seen
            .write()
            .map_err(|err| TaskKillError::dispatch(std::io::Error::other(err.to_string())))?;
        seen.push(snapshot);
        Ok(())
    }
}

mock! {
    Killer {}

    #[async_trait]
    impl TaskKiller for Killer {
        async fn kill_task(&self, task_id: &TaskId, recovery: RecoveryType) -> TaskKillResult<()>;
    }
}
