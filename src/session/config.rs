//! Session configuration

use crate::capture::frame::Resolution;
use crate::recorder::writer::Container;
use crate::utils::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration shared by every camera slot in a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Directory recordings are written to (created if absent)
    pub output_dir: PathBuf,

    /// Fixed resolution every source is normalized to
    pub resolution: Resolution,

    /// Target frame rate for recorded files
    pub record_fps: u32,

    /// Per-camera frame queue bound
    pub queue_capacity: usize,

    /// Container/codec for recorded files
    pub container: Container,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("recordings"),
            resolution: Resolution {
                width: 1280,
                height: 720,
            },
            record_fps: 30,
            queue_capacity: crate::capture::queue::DEFAULT_QUEUE_CAPACITY,
            container: Container::Mjpeg,
        }
    }
}

impl SessionConfig {
    /// Load a configuration from a JSON file; absent keys take their defaults
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
