//! Capture source traits
//!
//! A `FrameSource` is one camera's decoded-frame feed; a `SourceProvider`
//! knows how to open one from a stream URI. The session controller only ever
//! talks to these traits, so tests substitute scripted sources and the
//! production pipeline plugs in the ffmpeg-backed implementation.

use crate::capture::frame::{Frame, Resolution};
use thiserror::Error;

/// Errors produced by capture sources
#[derive(Error, Debug)]
pub enum SourceError {
    /// The stream could not be opened; the slot stays unregistered
    #[error("connection failed: {0}")]
    Connection(String),

    /// A transient read failure; the last-known frame stays on preview
    #[error("read failed: {0}")]
    Read(String),

    /// The stream ended; no more frames will be produced
    #[error("end of stream")]
    EndOfStream,
}

/// Result type for capture operations
pub type SourceResult<T> = Result<T, SourceError>;

/// A single camera's decoded-frame feed
///
/// `read_frame` blocks until the decoder produces the next frame or the
/// stream ends; frames arrive already normalized to the session resolution.
pub trait FrameSource: Send {
    /// Read the next decoded frame
    fn read_frame(&mut self) -> SourceResult<Frame>;

    /// The fixed resolution frames are normalized to
    fn resolution(&self) -> Resolution;

    /// Release the underlying decoder; further reads return `EndOfStream`
    fn close(&mut self);
}

/// Opens frame sources from stream URIs
pub trait SourceProvider: Send + Sync {
    /// Open a stream, normalizing its frames to `resolution`
    fn open(&self, uri: &str, resolution: Resolution) -> SourceResult<Box<dyn FrameSource>>;
}
