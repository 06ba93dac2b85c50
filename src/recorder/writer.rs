//! Video output writers
//!
//! A `VideoWriter` accepts appended frames and produces a playable file on
//! finalize. The production implementation pipes raw BGR24 frames into an
//! `ffmpeg` encode subprocess; tests substitute an in-memory writer through
//! the `WriterFactory` seam.

use crate::capture::frame::{Frame, Resolution};
use crate::session::SlotId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use thiserror::Error;

/// Errors that can occur while recording
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("already recording")]
    AlreadyRecording,

    #[error("not recording")]
    NotRecording,

    #[error("encoder error: {0}")]
    Encoder(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for recording operations
pub type RecorderResult<T> = Result<T, RecorderError>;

/// Container/codec choice for recorded files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// Motion-JPEG in an AVI container
    Mjpeg,
    /// H.264 in an MP4 container
    H264,
}

impl Container {
    /// File extension for this container
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mjpeg => "avi",
            Container::H264 => "mp4",
        }
    }
}

/// Everything a writer needs to open an output container
#[derive(Debug, Clone)]
pub struct RecordingSpec {
    pub output_dir: PathBuf,
    pub resolution: Resolution,
    pub fps: u32,
    pub container: Container,
}

/// A growing video file that frames are appended to
pub trait VideoWriter: Send {
    /// Append one frame to the container
    fn append(&mut self, frame: &Frame) -> RecorderResult<()>;

    /// Flush and close the container so it becomes a playable file
    fn finalize(&mut self) -> RecorderResult<()>;

    /// Path of the file being written
    fn path(&self) -> &Path;
}

/// Opens video writers for camera slots
pub trait WriterFactory: Send + Sync {
    fn create(&self, slot: SlotId, spec: &RecordingSpec) -> RecorderResult<Box<dyn VideoWriter>>;
}

/// Output file name for one recording: `camera_{slot}_{yyyyMMdd_HHmmss}.{ext}`
pub fn recording_path(
    output_dir: &Path,
    slot: SlotId,
    container: Container,
    started_at: DateTime<Utc>,
) -> PathBuf {
    output_dir.join(format!(
        "camera_{}_{}.{}",
        slot,
        started_at.format("%Y%m%d_%H%M%S"),
        container.extension()
    ))
}

/// Writer factory backed by ffmpeg subprocesses
pub struct FfmpegWriterFactory;

impl WriterFactory for FfmpegWriterFactory {
    fn create(&self, slot: SlotId, spec: &RecordingSpec) -> RecorderResult<Box<dyn VideoWriter>> {
        std::fs::create_dir_all(&spec.output_dir)?;
        let path = recording_path(&spec.output_dir, slot, spec.container, Utc::now());
        Ok(Box::new(FfmpegWriter::open(path, spec)?))
    }
}

/// Argument list for the encode subprocess
///
/// Stderr stays quiet (`-nostats -loglevel error`): the pipe is only drained
/// on finalize, and ffmpeg's periodic stats line would fill it and stall the
/// encoder mid-recording.
fn encoder_args(path: &Path, spec: &RecordingSpec) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-nostats".into(),
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pixel_format".into(),
        "bgr24".into(),
        "-video_size".into(),
        format!("{}x{}", spec.resolution.width, spec.resolution.height),
        "-framerate".into(),
        spec.fps.to_string(),
        "-i".into(),
        "-".into(),
    ];
    match spec.container {
        Container::Mjpeg => {
            args.extend(["-c:v".into(), "mjpeg".into(), "-q:v".into(), "3".into()]);
        }
        Container::H264 => {
            args.extend([
                "-c:v".into(),
                "libx264".into(),
                "-preset".into(),
                "veryfast".into(),
                "-pix_fmt".into(),
                "yuv420p".into(),
                "-crf".into(),
                "18".into(),
                "-g".into(),
                (spec.fps * 2).to_string(),
                "-movflags".into(),
                "+faststart".into(),
            ]);
        }
    }
    args.push(path.to_string_lossy().to_string());
    args
}

/// Encodes appended frames through an ffmpeg subprocess
pub struct FfmpegWriter {
    path: PathBuf,
    process: Option<Child>,
}

impl FfmpegWriter {
    /// Spawn the encoder for `path` at the requested resolution and frame rate
    pub fn open(path: PathBuf, spec: &RecordingSpec) -> RecorderResult<Self> {
        let process = Command::new("ffmpeg")
            .args(encoder_args(&path, spec))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RecorderError::Encoder(format!("failed to start ffmpeg: {e}")))?;

        tracing::info!(
            "Opened encoder: {} @ {}fps -> {}",
            spec.resolution,
            spec.fps,
            path.display()
        );

        Ok(Self {
            path,
            process: Some(process),
        })
    }
}

impl VideoWriter for FfmpegWriter {
    fn append(&mut self, frame: &Frame) -> RecorderResult<()> {
        let process = self
            .process
            .as_mut()
            .ok_or_else(|| RecorderError::Encoder("encoder already finalized".to_string()))?;
        let stdin = process
            .stdin
            .as_mut()
            .ok_or_else(|| RecorderError::Encoder("encoder stdin was not captured".to_string()))?;
        stdin.write_all(&frame.data)?;
        Ok(())
    }

    fn finalize(&mut self) -> RecorderResult<()> {
        if let Some(mut process) = self.process.take() {
            // Closing stdin signals EOF; ffmpeg then flushes the container
            drop(process.stdin.take());
            let output = process.wait_with_output()?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                tracing::warn!(
                    "Encoder for {} exited with {}: {}",
                    self.path.display(),
                    output.status,
                    stderr.trim()
                );
            }
        }
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FfmpegWriter {
    fn drop(&mut self) {
        let _ = self.finalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_container_extensions() {
        assert_eq!(Container::Mjpeg.extension(), "avi");
        assert_eq!(Container::H264.extension(), "mp4");
    }

    #[test]
    fn test_recording_path_format() {
        let started = Utc.with_ymd_and_hms(2026, 3, 7, 14, 5, 9).unwrap();
        let path = recording_path(Path::new("/tmp/recordings"), 2, Container::Mjpeg, started);
        assert_eq!(
            path,
            PathBuf::from("/tmp/recordings/camera_2_20260307_140509.avi")
        );
    }

    #[test]
    fn test_recording_path_mp4() {
        let started = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap();
        let path = recording_path(Path::new("out"), 0, Container::H264, started);
        assert_eq!(path, PathBuf::from("out/camera_0_20261231_235959.mp4"));
    }

    fn spec(container: Container) -> RecordingSpec {
        RecordingSpec {
            output_dir: PathBuf::from("out"),
            resolution: Resolution {
                width: 1280,
                height: 720,
            },
            fps: 30,
            container,
        }
    }

    #[test]
    fn test_encoder_args_keep_stderr_quiet() {
        // Without these the stats line fills the un-drained stderr pipe and
        // stalls the encoder on long recordings
        for container in [Container::Mjpeg, Container::H264] {
            let args = encoder_args(Path::new("out/a.avi"), &spec(container));
            assert!(args.contains(&"-nostats".to_string()));
            let loglevel = args.iter().position(|a| a == "-loglevel").unwrap();
            assert_eq!(args[loglevel + 1], "error");
        }
    }

    #[test]
    fn test_encoder_args_match_container() {
        let mjpeg = encoder_args(Path::new("out/a.avi"), &spec(Container::Mjpeg));
        assert!(mjpeg.contains(&"mjpeg".to_string()));
        assert_eq!(mjpeg.last().unwrap(), "out/a.avi");

        let h264 = encoder_args(Path::new("out/a.mp4"), &spec(Container::H264));
        assert!(h264.contains(&"libx264".to_string()));
        assert!(h264.contains(&"1280x720".to_string()));
    }
}
