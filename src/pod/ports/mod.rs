//! Port contracts for pod lifecycle control.
//!
//! Ports define infrastructure-agnostic interfaces used by pod services.

pub mod killer;
pub mod metadata;
pub mod store;

pub use killer::{TaskKillError, TaskKillResult, TaskKiller};
pub use metadata::{TaskMetadataReader, TaskMetadataResult};
pub use store::{StateStoreError, StateStoreResult, TaskStateStore};
