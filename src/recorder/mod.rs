//! Recording system module
//!
//! One `Recorder` per camera drains that camera's frame queue on a dedicated
//! thread and feeds a `VideoWriter`:
//! - `runner`: the drain loop with cooperative stop and join-on-stop
//! - `writer`: output containers (ffmpeg subprocess) behind a factory seam
//! - `state`: the recorder state machine and recording metadata

pub mod runner;
pub mod state;
pub mod writer;

pub use runner::Recorder;
pub use state::{RecorderState, RecordingSummary};
pub use writer::{
    Container, FfmpegWriter, FfmpegWriterFactory, RecorderError, RecorderResult, RecordingSpec,
    VideoWriter, WriterFactory,
};
