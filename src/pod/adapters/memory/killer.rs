//! In-memory task killer recording dispatched terminations.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::pod::{
    domain::{RecoveryType, TaskId},
    ports::{TaskKillError, TaskKillResult, TaskKiller},
};

/// Task killer that records every dispatch in order instead of terminating
/// anything.
#[derive(Debug, Clone, Default)]
pub struct RecordingTaskKiller {
    kills: Arc<RwLock<Vec<(TaskId, RecoveryType)>>>,
}

impl RecordingTaskKiller {
    /// Creates a recorder with no dispatches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded dispatches in dispatch order.
    ///
    /// # Errors
    ///
    /// Returns a dispatch error when the recorder lock is poisoned.
    pub fn kills(&self) -> TaskKillResult<Vec<(TaskId, RecoveryType)>> {
        let kills = self
            .kills
            .read()
            .map_err(|err| TaskKillError::dispatch(std::io::Error::other(err.to_string())))?;
        Ok(kills.clone())
    }
}

#[async_trait]
impl TaskKiller for RecordingTaskKiller {
    async fn kill_task(&self, task_id: &TaskId, recovery: RecoveryType) -> TaskKillResult<()> {
        let mut kills = self
            .kills
            .write()
            .map_err(|err| TaskKillError::dispatch(std::io::Error::other(err.to_string())))?;
        kills.push((task_id.clone(), recovery));
        Ok(())
    }
}
