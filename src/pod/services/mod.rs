//! Application services for pod lifecycle orchestration.

mod lifecycle;

pub use lifecycle::{
    PodCommandReceipt, PodLifecycleError, PodLifecycleResult, PodLifecycleService, TaskFilter,
    TaskFilterError, TaskStatusSummary, UNKNOWN_POD_LABEL,
};
