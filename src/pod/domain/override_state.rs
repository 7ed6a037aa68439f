//! Goal-state override definitions and the override progress lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Developer-configured goal state for a task.
///
/// Configured goal states are owned by the service definition; operators
/// never set them directly. They exist here so the override label table can
/// be checked against them: an override's stable label must never collide
/// with a configured goal state label, because both share the same persisted
/// namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalState {
    /// No goal state configured.
    None,
    /// The task should run indefinitely.
    Running,
    /// The task should run to completion.
    Finished,
}

impl GoalState {
    /// Every configured goal state.
    pub const ALL: [Self; 3] = [Self::None, Self::Running, Self::Finished];

    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
        }
    }
}

impl fmt::Display for GoalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-imposed goal state override for a task.
///
/// Unlike [`GoalState`], overrides are applied by operators at runtime and
/// supersede the configured goal state until cleared. Each non-`None`
/// target carries two fixed labels: a stable label persisted in task state
/// storage and shown once the override has taken effect, and a transitional
/// label shown while the task is still entering the override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStateOverride {
    /// No override: defer to the task's configured goal state.
    None,
    /// The task is overridden to a stopped debug mode.
    Stopped,
}

impl GoalStateOverride {
    /// Every override target.
    pub const ALL: [Self; 2] = [Self::None, Self::Stopped];

    /// Returns the stable label persisted and shown for tasks settled in
    /// this override, or `None` for the no-override target.
    ///
    /// WARNING: stable labels are stored in task state storage and cannot
    /// easily be changed.
    #[must_use]
    pub const fn stable_label(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Stopped => Some("STOPPED"),
        }
    }

    /// Returns the label shown for tasks still entering this override.
    ///
    /// Transitional labels are display-only and never persisted.
    #[must_use]
    pub const fn transitional_label(self) -> &'static str {
        match self {
            Self::None => "STARTING",
            Self::Stopped => "STOPPING",
        }
    }

    /// Constructs an override status targeting this override.
    #[must_use]
    pub const fn status(self, progress: OverrideProgress) -> OverrideStatus {
        OverrideStatus::new(self, progress)
    }
}

impl fmt::Display for GoalStateOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "NONE",
            Self::Stopped => "STOPPED",
        })
    }
}

const fn bytes_eq(a: &[u8], b: &[u8]) -> bool {
    match (a, b) {
        ([], []) => true,
        ([x, rest_a @ ..], [y, rest_b @ ..]) => *x == *y && bytes_eq(rest_a, rest_b),
        _ => false,
    }
}

const fn label_in(label: &str, labels: &[&str]) -> bool {
    match labels {
        [] => false,
        [head, tail @ ..] => bytes_eq(label.as_bytes(), head.as_bytes()) || label_in(label, tail),
    }
}

const fn stable_labels_collide(overrides: &[GoalStateOverride], goals: &[&str]) -> bool {
    match overrides {
        [] => false,
        [head, tail @ ..] => {
            let head_collides = match head.stable_label() {
                Some(label) => label_in(label, goals),
                None => false,
            };
            head_collides || stable_labels_collide(tail, goals)
        }
    }
}

const GOAL_STATE_LABELS: [&str; 3] = [
    GoalState::None.as_str(),
    GoalState::Running.as_str(),
    GoalState::Finished.as_str(),
];

// Overrides and configured goal states share the persisted label namespace.
const _: () = assert!(
    !stable_labels_collide(&GoalStateOverride::ALL, &GOAL_STATE_LABELS),
    "override stable label collides with a configured goal state label",
);

/// How far a target override's adoption has proceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideProgress {
    /// The desired override has been recorded, but no action has been taken
    /// yet. In practice this state appears only briefly.
    Pending,
    /// Task termination has been dispatched but the override has not yet
    /// finished taking effect.
    InProgress,
    /// The override, or its absence, is settled.
    Complete,
}

impl OverrideProgress {
    /// Returns the persisted label.
    ///
    /// WARNING: progress labels are stored in task state storage and cannot
    /// easily be changed.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Complete => "COMPLETE",
        }
    }
}

impl fmt::Display for OverrideProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current override state of a task: a target paired with its progress.
///
/// Sample flow for enabling and then disabling an override:
///
/// 1. `None` + `Complete` (inactive)
/// 2. `Stopped` + `Pending`
/// 3. `Stopped` + `InProgress`
/// 4. `Stopped` + `Complete`
/// 5. `None` + `Pending`
/// 6. `None` + `InProgress`
/// 7. `None` + `Complete` (inactive)
///
/// The lifecycle controller produces the `Pending` and `InProgress` steps;
/// the `Complete` transitions belong to the external reconciliation
/// process. Equality is structural, so the canonical [`Self::INACTIVE`]
/// value compares equal to any freshly constructed `(None, Complete)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverrideStatus {
    target: GoalStateOverride,
    progress: OverrideProgress,
}

impl OverrideStatus {
    /// The status of a task for which no override is applicable: the task
    /// is not entering, exiting, or currently in an override state.
    pub const INACTIVE: Self = Self::new(GoalStateOverride::None, OverrideProgress::Complete);

    /// Constructs an override status.
    #[must_use]
    pub const fn new(target: GoalStateOverride, progress: OverrideProgress) -> Self {
        Self { target, progress }
    }

    /// Returns the override target.
    #[must_use]
    pub const fn target(self) -> GoalStateOverride {
        self.target
    }

    /// Returns the adoption progress.
    #[must_use]
    pub const fn progress(self) -> OverrideProgress {
        self.progress
    }

    /// Returns a copy with the progress replaced.
    ///
    /// Does not validate that the transition follows the legal forward
    /// sequence; callers only ever advance `Pending` to `InProgress`, and
    /// the `Complete` transition is never produced here.
    #[must_use]
    pub const fn with_progress(self, progress: OverrideProgress) -> Self {
        Self {
            target: self.target,
            progress,
        }
    }

    /// Returns whether any override is applicable to the task.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(
            (self.target, self.progress),
            (GoalStateOverride::None, OverrideProgress::Complete)
        )
    }
}

impl fmt::Display for OverrideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.target, self.progress)
    }
}
