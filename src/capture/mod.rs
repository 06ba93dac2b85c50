//! Stream capture
//!
//! The producer half of the pipeline: frame types, the bounded per-camera
//! queue, the source traits, and the ffmpeg-backed RTSP decoder.

pub mod ffmpeg;
pub mod frame;
pub mod queue;
pub mod source;

pub use ffmpeg::FfmpegSourceProvider;
pub use frame::{Frame, Resolution};
pub use queue::{FrameQueue, DEFAULT_QUEUE_CAPACITY};
pub use source::{FrameSource, SourceError, SourceProvider, SourceResult};
