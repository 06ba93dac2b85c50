//! FFmpeg-backed stream source
//!
//! Decoding is delegated to an `ffmpeg` subprocess: it pulls the RTSP stream,
//! scales every frame to the session resolution, and writes raw BGR24 frames
//! to stdout where `read_frame` picks them up one at a time.

use crate::capture::frame::{Frame, Resolution};
use crate::capture::source::{FrameSource, SourceError, SourceProvider, SourceResult};
use bytes::Bytes;
use std::io::Read;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// How long to wait for the decoder's first output byte (or an early exit)
/// before treating the stream as connected-but-slow
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// First byte read off the decoder's stdout, handed back with the pipe
type FirstRead = (std::io::Result<u8>, ChildStdout);

/// Outcome of waiting for the decoder's first output byte
enum Handshake {
    /// The first byte arrived within the timeout
    Ready(ChildStdout, u8),
    /// Nothing yet; the receiver yields the first byte whenever it comes
    Pending(Receiver<FirstRead>),
    /// The decoder closed stdout without producing anything
    Failed(String),
}

/// Wait up to `timeout` for one byte of decoder output
///
/// Returns as soon as the byte arrives or stdout closes, so a healthy camera
/// registers immediately and a bad URI fails as fast as ffmpeg gives up.
fn await_first_byte(mut stdout: ChildStdout, timeout: Duration) -> Handshake {
    let (tx, rx) = mpsc::channel();
    let spawned = std::thread::Builder::new()
        .name("stream-handshake".to_string())
        .spawn(move || {
            let mut byte = [0u8; 1];
            let result = stdout.read_exact(&mut byte).map(|_| byte[0]);
            let _ = tx.send((result, stdout));
        });
    if spawned.is_err() {
        return Handshake::Failed("failed to spawn handshake thread".to_string());
    }
    match rx.recv_timeout(timeout) {
        Ok((Ok(byte), stdout)) => Handshake::Ready(stdout, byte),
        Ok((Err(e), _)) => Handshake::Failed(e.to_string()),
        Err(RecvTimeoutError::Timeout) => Handshake::Pending(rx),
        Err(RecvTimeoutError::Disconnected) => {
            Handshake::Failed("handshake read abandoned".to_string())
        }
    }
}

/// Opens RTSP (or any ffmpeg-readable) streams as raw-frame subprocesses
pub struct FfmpegSourceProvider;

impl SourceProvider for FfmpegSourceProvider {
    fn open(&self, uri: &str, resolution: Resolution) -> SourceResult<Box<dyn FrameSource>> {
        if uri.trim().is_empty() {
            return Err(SourceError::Connection("empty stream uri".to_string()));
        }

        if Command::new("ffmpeg").arg("-version").output().is_err() {
            return Err(SourceError::Connection(
                "ffmpeg not found on PATH".to_string(),
            ));
        }

        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
        ];
        if uri.starts_with("rtsp://") {
            // TCP interleaving avoids UDP packet loss on congested camera links
            args.extend(["-rtsp_transport".into(), "tcp".into()]);
        }
        args.extend([
            "-i".into(),
            uri.to_string(),
            "-an".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pix_fmt".into(),
            "bgr24".into(),
            "-vf".into(),
            format!("scale={}:{}", resolution.width, resolution.height),
            "-".into(),
        ]);

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SourceError::Connection(format!("failed to spawn ffmpeg: {e}")))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            SourceError::Connection("decoder stdout was not captured".to_string())
        })?;

        let state = match await_first_byte(stdout, CONNECT_TIMEOUT) {
            Handshake::Ready(stdout, byte) => StreamState::Streaming {
                stdout,
                lead: Some(byte),
            },
            Handshake::Pending(rx) => {
                // No output yet; if the process already died that is a
                // connection failure, otherwise the stream is just slow
                if let Ok(Some(status)) = child.try_wait() {
                    let detail = stderr_tail(&mut child);
                    return Err(SourceError::Connection(format!(
                        "decoder exited with {status}: {detail}"
                    )));
                }
                StreamState::Connecting(rx)
            }
            Handshake::Failed(detail) => {
                let _ = child.kill();
                let tail = stderr_tail(&mut child);
                let _ = child.wait();
                return Err(SourceError::Connection(format!(
                    "decoder produced no output ({detail}): {tail}"
                )));
            }
        };

        tracing::info!("Opened stream {} at {}", uri, resolution);

        Ok(Box::new(FfmpegSource {
            uri: uri.to_string(),
            child: Some(child),
            state,
            resolution,
            opened_at: Instant::now(),
        }))
    }
}

/// Where the decoded byte stream currently lives
enum StreamState {
    /// Waiting on the handshake read for the first output byte
    Connecting(Receiver<FirstRead>),
    /// Reading frames directly, with at most one handshake byte to replay
    Streaming {
        stdout: ChildStdout,
        lead: Option<u8>,
    },
    Closed,
}

/// One camera decoded by an ffmpeg subprocess
pub struct FfmpegSource {
    uri: String,
    child: Option<Child>,
    state: StreamState,
    resolution: Resolution,
    opened_at: Instant,
}

impl FrameSource for FfmpegSource {
    fn read_frame(&mut self) -> SourceResult<Frame> {
        loop {
            match std::mem::replace(&mut self.state, StreamState::Closed) {
                StreamState::Closed => return Err(SourceError::EndOfStream),
                StreamState::Connecting(rx) => match rx.recv() {
                    Ok((Ok(byte), stdout)) => {
                        self.state = StreamState::Streaming {
                            stdout,
                            lead: Some(byte),
                        };
                    }
                    Ok((Err(e), _)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                        self.close();
                        return Err(SourceError::EndOfStream);
                    }
                    Ok((Err(e), _)) => {
                        self.close();
                        return Err(SourceError::Read(e.to_string()));
                    }
                    Err(_) => {
                        self.close();
                        return Err(SourceError::EndOfStream);
                    }
                },
                StreamState::Streaming {
                    mut stdout,
                    mut lead,
                } => {
                    let mut buf = vec![0u8; self.resolution.frame_len()];
                    let mut offset = 0;
                    if let Some(byte) = lead.take() {
                        buf[0] = byte;
                        offset = 1;
                    }
                    match stdout.read_exact(&mut buf[offset..]) {
                        Ok(()) => {
                            self.state = StreamState::Streaming { stdout, lead: None };
                            return Ok(Frame::new(
                                Bytes::from(buf),
                                self.resolution,
                                self.opened_at.elapsed().as_secs_f64() * 1000.0,
                            ));
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                            self.close();
                            return Err(SourceError::EndOfStream);
                        }
                        Err(e) => {
                            // The frame boundary is lost mid-read; the pipe
                            // cannot be resynchronized
                            self.close();
                            return Err(SourceError::Read(e.to_string()));
                        }
                    }
                }
            }
        }
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn close(&mut self) {
        self.state = StreamState::Closed;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            tracing::info!("Closed stream {}", self.uri);
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Read whatever the decoder left on stderr, trimmed to its last line
fn stderr_tail(child: &mut Child) -> String {
    let mut detail = String::new();
    if let Some(mut stderr) = child.stderr.take() {
        let _ = stderr.read_to_string(&mut detail);
    }
    detail
        .lines()
        .last()
        .unwrap_or("no diagnostic output")
        .to_string()
}
