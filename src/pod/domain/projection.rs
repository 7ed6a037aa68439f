//! Projection of raw runtime state and override status into display labels.

use super::{OverrideStatus, RawTaskState};

/// Well-known prefix shared by every resource-manager state label.
const STATE_LABEL_PREFIX: &str = "TASK_";

/// Strips the resource-manager prefix from a state label.
///
/// `TASK_RUNNING` becomes `RUNNING`; labels without the prefix pass through
/// unchanged.
#[must_use]
pub fn strip_state_prefix(label: &str) -> &str {
    label.strip_prefix(STATE_LABEL_PREFIX).unwrap_or(label)
}

/// Projects a task's raw runtime state and persisted override status into a
/// single user-facing status label.
///
/// While an override is applicable, entering states (killing, killed,
/// staging, starting) display the target's transitional label and the
/// running state displays the target's stable label. All other combinations
/// fall through to the prefix-stripped raw state label.
///
/// The no-override target has no stable label, so a running task clearing
/// an override displays its raw state until the reconciliation process
/// settles the clear.
#[must_use]
pub fn display_status(state: RawTaskState, override_status: OverrideStatus) -> String {
    if override_status.is_active() {
        match state {
            RawTaskState::Killing
            | RawTaskState::Killed
            | RawTaskState::Staging
            | RawTaskState::Starting => {
                // Entering the desired override state.
                return override_status.target().transitional_label().to_owned();
            }
            RawTaskState::Running => {
                // Settled in the desired override state.
                if let Some(label) = override_status.target().stable_label() {
                    return label.to_owned();
                }
            }
            _ => {}
        }
    }
    strip_state_prefix(state.as_str()).to_owned()
}
