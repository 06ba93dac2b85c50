//! Test doubles for the capture and recording seams

use crate::capture::frame::{Frame, Resolution};
use crate::capture::source::{FrameSource, SourceError, SourceProvider, SourceResult};
use crate::recorder::writer::{
    RecorderError, RecorderResult, RecordingSpec, VideoWriter, WriterFactory,
};
use crate::session::SlotId;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

const TEST_RESOLUTION: Resolution = Resolution {
    width: 2,
    height: 2,
};

/// A tiny frame whose first byte identifies it in assertions
pub fn marker_frame(marker: u8) -> Frame {
    Frame::new(
        Bytes::from(vec![marker; TEST_RESOLUTION.frame_len()]),
        TEST_RESOLUTION,
        marker as f64,
    )
}

/// Scripted frame source: yields its frames in order, then `EndOfStream`
pub struct MockSource {
    frames: VecDeque<Frame>,
    fail_reads: bool,
    closed: Arc<AtomicBool>,
}

impl FrameSource for MockSource {
    fn read_frame(&mut self) -> SourceResult<Frame> {
        if self.fail_reads {
            return Err(SourceError::Read("scripted read failure".to_string()));
        }
        self.frames.pop_front().ok_or(SourceError::EndOfStream)
    }

    fn resolution(&self) -> Resolution {
        TEST_RESOLUTION
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

/// Provider handing out pre-scripted sources by URI; unknown URIs fail to
/// connect
pub struct MockSourceProvider {
    sources: Mutex<HashMap<String, MockSource>>,
    closed_flags: HashMap<String, Arc<AtomicBool>>,
}

impl MockSourceProvider {
    pub fn new() -> Self {
        Self {
            sources: Mutex::new(HashMap::new()),
            closed_flags: HashMap::new(),
        }
    }

    /// Script `count` marker frames (0..count) for `uri`
    pub fn with_frames(mut self, uri: &str, count: u8) -> Self {
        let closed = Arc::new(AtomicBool::new(false));
        self.closed_flags.insert(uri.to_string(), closed.clone());
        self.sources.lock().insert(
            uri.to_string(),
            MockSource {
                frames: (0..count).map(marker_frame).collect(),
                fail_reads: false,
                closed,
            },
        );
        self
    }

    /// Script a source whose every read fails
    pub fn with_failing_reads(mut self, uri: &str) -> Self {
        let closed = Arc::new(AtomicBool::new(false));
        self.closed_flags.insert(uri.to_string(), closed.clone());
        self.sources.lock().insert(
            uri.to_string(),
            MockSource {
                frames: VecDeque::new(),
                fail_reads: true,
                closed,
            },
        );
        self
    }

    /// Flag set once the source for `uri` has been closed
    pub fn closed_flag(&self, uri: &str) -> Option<Arc<AtomicBool>> {
        self.closed_flags.get(uri).cloned()
    }
}

impl SourceProvider for MockSourceProvider {
    fn open(&self, uri: &str, _resolution: Resolution) -> SourceResult<Box<dyn FrameSource>> {
        self.sources
            .lock()
            .remove(uri)
            .map(|s| Box::new(s) as Box<dyn FrameSource>)
            .ok_or_else(|| SourceError::Connection(format!("no camera at {uri}")))
    }
}

/// What a mock writer observed
#[derive(Default)]
pub struct WriterLog {
    /// First byte of every appended frame, in append order
    pub markers: Vec<u8>,
    /// Whether `finalize` ran
    pub finalized: bool,
}

/// In-memory video writer recording markers instead of pixels
pub struct MockWriter {
    log: Arc<Mutex<WriterLog>>,
    fail_appends: bool,
    path: PathBuf,
}

impl MockWriter {
    pub fn new() -> (Self, Arc<Mutex<WriterLog>>) {
        let log = Arc::new(Mutex::new(WriterLog::default()));
        (
            Self {
                log: log.clone(),
                fail_appends: false,
                path: PathBuf::from("mock.avi"),
            },
            log,
        )
    }

    /// A writer whose every append fails
    pub fn failing() -> (Self, Arc<Mutex<WriterLog>>) {
        let (mut writer, log) = Self::new();
        writer.fail_appends = true;
        (writer, log)
    }
}

impl VideoWriter for MockWriter {
    fn append(&mut self, frame: &Frame) -> RecorderResult<()> {
        if self.fail_appends {
            return Err(RecorderError::Encoder("scripted append failure".to_string()));
        }
        self.log.lock().markers.push(frame.data[0]);
        Ok(())
    }

    fn finalize(&mut self) -> RecorderResult<()> {
        self.log.lock().finalized = true;
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Factory handing out mock writers and keeping their logs by slot
pub struct MockWriterFactory {
    logs: Mutex<HashMap<SlotId, Arc<Mutex<WriterLog>>>>,
    fail_slots: Vec<SlotId>,
    created: AtomicUsize,
}

impl MockWriterFactory {
    pub fn new() -> Self {
        Self {
            logs: Mutex::new(HashMap::new()),
            fail_slots: Vec::new(),
            created: AtomicUsize::new(0),
        }
    }

    /// Refuse to open a container for `slot`
    pub fn failing_for(mut self, slot: SlotId) -> Self {
        self.fail_slots.push(slot);
        self
    }

    /// Number of writers successfully created
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Log of the writer created for `slot`
    pub fn log_for(&self, slot: SlotId) -> Option<Arc<Mutex<WriterLog>>> {
        self.logs.lock().get(&slot).cloned()
    }
}

impl WriterFactory for MockWriterFactory {
    fn create(&self, slot: SlotId, _spec: &RecordingSpec) -> RecorderResult<Box<dyn VideoWriter>> {
        if self.fail_slots.contains(&slot) {
            return Err(RecorderError::Encoder(format!(
                "scripted open failure for slot {slot}"
            )));
        }
        let (writer, log) = MockWriter::new();
        self.logs.lock().insert(slot, log);
        self.created.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(writer))
    }
}
