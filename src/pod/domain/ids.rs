//! Identifier and validated scalar types for the pod domain.

use super::PodDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque task identifier assigned by the cluster resource manager.
///
/// The resource manager owns the identifier format; this crate only ever
/// compares identifiers for exact equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a validated task identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PodDomainError::EmptyTaskId`] when the value is empty after
    /// trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, PodDomainError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(PodDomainError::EmptyTaskId);
        }
        Ok(Self(raw))
    }

    /// Generates a fresh identifier for the named task.
    ///
    /// Follows the `<task-name>__<uuid>` convention used when launching
    /// tasks, so generated identifiers remain traceable to their task.
    #[must_use]
    pub fn generate(name: &TaskName) -> Self {
        Self(format!("{}__{}", name.as_str(), Uuid::new_v4()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task name within a pod, such as `pod-0-server`.
///
/// By convention names prefix the pod instance name, but the crate never
/// parses them; pod membership comes from the metadata reader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskName(String);

impl TaskName {
    /// Creates a validated task name.
    ///
    /// # Errors
    ///
    /// Returns [`PodDomainError::EmptyTaskName`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, PodDomainError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(PodDomainError::EmptyTaskName);
        }
        Ok(Self(raw))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pod identity derived from task metadata: a pod type plus instance index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PodIdentity {
    pod_type: String,
    index: u32,
}

impl PodIdentity {
    /// Creates a validated pod identity.
    ///
    /// # Errors
    ///
    /// Returns [`PodDomainError::InvalidPodType`] when the pod type is empty
    /// or contains whitespace.
    pub fn new(pod_type: impl Into<String>, index: u32) -> Result<Self, PodDomainError> {
        let raw = pod_type.into();
        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return Err(PodDomainError::InvalidPodType(raw));
        }
        Ok(Self {
            pod_type: raw,
            index,
        })
    }

    /// Returns the pod type.
    #[must_use]
    pub fn pod_type(&self) -> &str {
        &self.pod_type
    }

    /// Returns the pod instance index.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Returns the derived pod instance name, `<pod-type>-<index>`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}-{}", self.pod_type, self.index)
    }
}

impl fmt::Display for PodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.pod_type, self.index)
    }
}
