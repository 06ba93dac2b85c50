//! Per-camera recorder thread
//!
//! Each active recording owns one dedicated thread that drains the camera's
//! frame queue at the target rate and appends every popped frame to a video
//! writer. Stopping is cooperative: a flag checked once per loop iteration,
//! with the caller blocking on join so the output file is finalized before
//! `stop` returns.

use crate::capture::queue::FrameQueue;
use crate::recorder::state::{RecorderState, RecordingSummary};
use crate::recorder::writer::{RecorderResult, VideoWriter};
use crate::session::SlotId;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Sleep between polls while waiting out the frame interval or an empty queue
const IDLE_WAIT: Duration = Duration::from_millis(1);

/// One camera's recording, running on its own thread
pub struct Recorder {
    slot: SlotId,
    id: Uuid,
    path: PathBuf,
    started_at: DateTime<Utc>,
    state: Arc<RwLock<RecorderState>>,
    stop: Arc<AtomicBool>,
    frames_written: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl Recorder {
    /// Begin recording: clear stale pre-roll frames from the queue and spawn
    /// the drain loop
    pub fn start(
        slot: SlotId,
        queue: Arc<FrameQueue>,
        mut writer: Box<dyn VideoWriter>,
        target_fps: u32,
    ) -> RecorderResult<Self> {
        let id = Uuid::new_v4();
        let path = writer.path().to_path_buf();
        let started_at = Utc::now();
        let state = Arc::new(RwLock::new(RecorderState::Recording));
        let stop = Arc::new(AtomicBool::new(false));
        let frames_written = Arc::new(AtomicU64::new(0));

        // Frames queued before this point belong to the preview era, not the
        // recording
        queue.clear();

        let interval = Duration::from_secs_f64(1.0 / target_fps.max(1) as f64);
        let thread_state = state.clone();
        let thread_stop = stop.clone();
        let thread_frames = frames_written.clone();
        let thread_path = path.clone();

        let handle = std::thread::Builder::new()
            .name(format!("recorder-{slot}"))
            .spawn(move || {
                let mut last_frame = Instant::now();
                while !thread_stop.load(Ordering::Relaxed) {
                    if last_frame.elapsed() >= interval {
                        match queue.pop() {
                            Some(frame) => {
                                // Best effort: a failed append is logged and
                                // the loop keeps going
                                match writer.append(&frame) {
                                    Ok(()) => {
                                        thread_frames.fetch_add(1, Ordering::Relaxed);
                                    }
                                    Err(e) => {
                                        tracing::warn!(
                                            "Dropping frame for {}: {}",
                                            thread_path.display(),
                                            e
                                        );
                                    }
                                }
                                last_frame = Instant::now();
                            }
                            None => std::thread::sleep(IDLE_WAIT),
                        }
                    } else {
                        std::thread::sleep(IDLE_WAIT);
                    }
                }

                *thread_state.write() = RecorderState::Finalizing;
                if let Err(e) = writer.finalize() {
                    tracing::warn!("Failed to finalize {}: {}", thread_path.display(), e);
                }
                *thread_state.write() = RecorderState::Idle;
            })?;

        tracing::info!("Recording slot {} to {}", slot, path.display());

        Ok(Self {
            slot,
            id,
            path,
            started_at,
            state,
            stop,
            frames_written,
            handle: Some(handle),
        })
    }

    /// Current state of the drain loop
    pub fn state(&self) -> RecorderState {
        *self.state.read()
    }

    /// Whether the drain loop is still running
    pub fn is_recording(&self) -> bool {
        self.state() == RecorderState::Recording
    }

    /// Frames appended so far
    pub fn frames_written(&self) -> u64 {
        self.frames_written.load(Ordering::Relaxed)
    }

    /// Signal the loop to stop and block until the output file is finalized
    pub fn stop(mut self) -> RecordingSummary {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        let frames = self.frames_written.load(Ordering::Relaxed);
        tracing::info!(
            "Stopped recording slot {}: {} frames -> {}",
            self.slot,
            frames,
            self.path.display()
        );

        RecordingSummary {
            id: self.id,
            slot: self.slot,
            path: self.path.clone(),
            frames_written: frames,
            started_at: self.started_at,
            ended_at: Utc::now(),
        }
    }
}

impl Drop for Recorder {
    /// A recorder dropped without `stop` still signals its thread and joins
    /// it, so the loop never outlives the handle
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
