//! Adapter implementations for pod lifecycle ports.
//!
//! Only in-memory adapters live here: the persistent store's storage
//! engine, the resource-manager kill path, and the metadata encoding are
//! external collaborators supplied by the embedding scheduler.

pub mod memory;

pub use memory::{InMemoryMetadataCatalog, InMemoryTaskStateStore, RecordingTaskKiller};
