//! Session controller
//!
//! Owns the set of camera slots and their lifecycles. All methods are
//! synchronous and expected to be called from one logical thread (the front
//! end); the per-slot frame queue is the only state shared with recorder
//! threads. `tick` is driven by an external cadence (~60 Hz in the reference
//! front end) and is deliberately not a scheduler of its own.

use crate::capture::ffmpeg::FfmpegSourceProvider;
use crate::capture::queue::FrameQueue;
use crate::capture::source::{FrameSource, SourceError, SourceProvider, SourceResult};
use crate::preview::{NullPreview, PreviewSink};
use crate::recorder::runner::Recorder;
use crate::recorder::state::RecordingSummary;
use crate::recorder::writer::{
    FfmpegWriterFactory, RecorderError, RecorderResult, RecordingSpec, WriterFactory,
};
use crate::session::{SessionConfig, SlotId};
use std::sync::Arc;

/// Per-camera state bundle
struct CameraSlot {
    uri: String,
    source: Option<Box<dyn FrameSource>>,
    queue: Arc<FrameQueue>,
    recorder: Option<Recorder>,
}

/// Orchestrates capture, preview and recording for a set of cameras
pub struct SessionController {
    config: SessionConfig,
    slots: Vec<CameraSlot>,
    provider: Box<dyn SourceProvider>,
    writers: Arc<dyn WriterFactory>,
    preview: Arc<dyn PreviewSink>,
}

impl SessionController {
    /// Create a controller with the production ffmpeg source/writer backends
    /// and no preview
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
            provider: Box::new(FfmpegSourceProvider),
            writers: Arc::new(FfmpegWriterFactory),
            preview: Arc::new(NullPreview),
        }
    }

    /// Substitute the source backend
    pub fn with_provider(mut self, provider: Box<dyn SourceProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Substitute the writer backend
    pub fn with_writer_factory(mut self, writers: Arc<dyn WriterFactory>) -> Self {
        self.writers = writers;
        self
    }

    /// Attach a preview sink
    pub fn with_preview(mut self, preview: Arc<dyn PreviewSink>) -> Self {
        self.preview = preview;
        self
    }

    /// The session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of registered camera slots
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// URI a slot was registered with
    pub fn slot_uri(&self, slot: SlotId) -> Option<&str> {
        self.slots.get(slot).map(|s| s.uri.as_str())
    }

    /// Whether a slot currently has an active recorder
    pub fn is_recording(&self, slot: SlotId) -> bool {
        self.slots
            .get(slot)
            .and_then(|s| s.recorder.as_ref())
            .is_some()
    }

    /// Open a stream and allocate a slot for it
    ///
    /// On failure the slot table is left unchanged.
    pub fn register_camera(&mut self, uri: &str) -> SourceResult<SlotId> {
        let source = self.provider.open(uri, self.config.resolution)?;
        let slot = self.slots.len();
        tracing::info!(
            "Registered camera {} as slot {} ({})",
            uri,
            slot,
            source.resolution()
        );
        self.slots.push(CameraSlot {
            uri: uri.to_string(),
            source: Some(source),
            queue: Arc::new(FrameQueue::new(self.config.queue_capacity)),
            recorder: None,
        });
        Ok(slot)
    }

    /// Capture one frame from every open source, best effort
    ///
    /// Each frame goes into the slot's queue and out to the preview sink. A
    /// read failure on one camera never affects the others; the preview keeps
    /// that camera's last-known frame.
    pub fn tick(&mut self) {
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            let Some(source) = entry.source.as_mut() else {
                continue;
            };
            match source.read_frame() {
                Ok(frame) => {
                    entry.queue.push(frame.clone());
                    self.preview.present(slot, &frame);
                }
                Err(SourceError::EndOfStream) => {
                    tracing::debug!("Slot {} ({}): stream ended", slot, entry.uri);
                }
                Err(e) => {
                    tracing::warn!("Slot {} ({}): {}", slot, entry.uri, e);
                }
            }
        }
    }

    /// Start recording one slot; a no-op if it is already recording
    pub fn start_recording(&mut self, slot: SlotId) -> RecorderResult<()> {
        let spec = RecordingSpec {
            output_dir: self.config.output_dir.clone(),
            resolution: self.config.resolution,
            fps: self.config.record_fps,
            container: self.config.container,
        };
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or_else(|| RecorderError::Configuration(format!("no such slot {slot}")))?;
        if entry.recorder.is_some() {
            tracing::debug!("Slot {} is already recording", slot);
            return Ok(());
        }
        let writer = self.writers.create(slot, &spec)?;
        entry.recorder = Some(Recorder::start(slot, entry.queue.clone(), writer, spec.fps)?);
        Ok(())
    }

    /// Start recording every slot that is not already recording
    ///
    /// Returns the slots that failed to start; a failed output container on
    /// one camera never blocks the others.
    pub fn start_recording_all(&mut self) -> Vec<(SlotId, RecorderError)> {
        let mut failures = Vec::new();
        for slot in 0..self.slots.len() {
            if let Err(e) = self.start_recording(slot) {
                tracing::warn!("Slot {} failed to start recording: {}", slot, e);
                failures.push((slot, e));
            }
        }
        failures
    }

    /// Stop one slot's recording, blocking until its file is finalized
    ///
    /// Returns `None` if the slot was not recording.
    pub fn stop_recording(&mut self, slot: SlotId) -> Option<RecordingSummary> {
        let recorder = self.slots.get_mut(slot)?.recorder.take()?;
        Some(recorder.stop())
    }

    /// Stop every active recording; a no-op for slots that are not recording
    pub fn stop_recording_all(&mut self) -> Vec<(SlotId, RecordingSummary)> {
        let mut summaries = Vec::new();
        for slot in 0..self.slots.len() {
            if let Some(summary) = self.stop_recording(slot) {
                summaries.push((slot, summary));
            }
        }
        summaries
    }

    /// Stop all recordings and close every stream source
    ///
    /// Safe to call at any point, including when nothing was ever opened.
    pub fn shutdown(&mut self) {
        self.stop_recording_all();
        for entry in &mut self.slots {
            if let Some(mut source) = entry.source.take() {
                source.close();
            }
        }
        tracing::info!("Session shut down ({} slots)", self.slots.len());
    }

    #[cfg(test)]
    pub(crate) fn queue(&self, slot: SlotId) -> Arc<FrameQueue> {
        self.slots[slot].queue.clone()
    }
}
