//! camgrid - Multi-camera RTSP preview and recording pipeline.
//!
//! Per camera, decoded frames flow from a stream source into a bounded frame
//! queue, where they fan out to a preview sink (newest frame wins) and a
//! recorder thread that drains the queue at a fixed rate into a video file.
//! A [`session::SessionController`] owns the camera slots and exposes the
//! synchronous command API a front end drives: register cameras, `tick` the
//! capture loop at a fixed cadence, start/stop recording, shut down.
//!
//! Decoding and encoding are delegated to `ffmpeg` subprocesses; both sit
//! behind traits so other backends (or test doubles) can be substituted.

pub mod capture;
pub mod preview;
pub mod recorder;
pub mod session;
pub mod utils;

#[cfg(test)]
pub(crate) mod testutil;

pub use capture::{Frame, FrameQueue, Resolution, SourceError};
pub use preview::{LatestFrameCache, NullPreview, PreviewSink};
pub use recorder::{Container, RecorderError, RecorderState, RecordingSummary};
pub use session::{SessionConfig, SessionController, SlotId};
