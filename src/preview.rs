//! Preview sinks
//!
//! The capture tick republishes the newest frame of every live camera to a
//! `PreviewSink`. Rendering itself belongs to whatever front end is in use;
//! this crate ships a discard sink and a latest-frame cache that a front end
//! can poll at its own pace.

use crate::capture::frame::Frame;
use crate::session::SlotId;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Receives the newest frame of each camera slot
pub trait PreviewSink: Send + Sync {
    fn present(&self, slot: SlotId, frame: &Frame);
}

/// Discards all frames
pub struct NullPreview;

impl PreviewSink for NullPreview {
    fn present(&self, _slot: SlotId, _frame: &Frame) {}
}

/// Keeps the most recent frame per slot
///
/// A slot's entry is only ever replaced, never removed, so a camera that
/// stops producing keeps showing its last-known frame.
#[derive(Default)]
pub struct LatestFrameCache {
    frames: Mutex<HashMap<SlotId, Frame>>,
}

impl LatestFrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent frame seen for `slot`, if any
    pub fn latest(&self, slot: SlotId) -> Option<Frame> {
        self.frames.lock().get(&slot).cloned()
    }
}

impl PreviewSink for LatestFrameCache {
    fn present(&self, slot: SlotId, frame: &Frame) {
        self.frames.lock().insert(slot, frame.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::marker_frame;

    #[test]
    fn test_cache_keeps_newest_frame_per_slot() {
        let cache = LatestFrameCache::new();
        assert!(cache.latest(0).is_none());

        cache.present(0, &marker_frame(1));
        cache.present(0, &marker_frame(2));
        cache.present(1, &marker_frame(9));

        assert_eq!(cache.latest(0).unwrap().data[0], 2);
        assert_eq!(cache.latest(1).unwrap().data[0], 9);
        assert!(cache.latest(2).is_none());
    }
}
