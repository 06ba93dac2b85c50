//! Error types and handling
//!
//! Umbrella error for the paths that cross subsystem boundaries (config
//! loading, the CLI front end). The capture and recorder modules keep their
//! own focused error enums.

use crate::capture::source::SourceError;
use crate::recorder::writer::RecorderError;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("recorder error: {0}")]
    Recorder(#[from] RecorderError),
}

/// Result type alias using the umbrella error
pub type Result<T> = std::result::Result<T, Error>;
