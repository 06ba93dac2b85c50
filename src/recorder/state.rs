//! Recorder state and session metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::session::SlotId;

/// Current state of one camera's recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    /// No recording in progress
    Idle,
    /// The recorder thread is draining the frame queue
    Recording,
    /// Stop observed; the output container is being flushed and closed
    Finalizing,
}

impl Default for RecorderState {
    fn default() -> Self {
        Self::Idle
    }
}

/// What one completed recording produced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSummary {
    /// Unique id of this recording session
    pub id: Uuid,

    /// Camera slot the recording came from
    pub slot: SlotId,

    /// Path of the finalized video file
    pub path: PathBuf,

    /// Number of frames appended to the container
    pub frames_written: u64,

    /// When recording started
    pub started_at: DateTime<Utc>,

    /// When the recorder thread finished finalizing
    pub ended_at: DateTime<Utc>,
}
