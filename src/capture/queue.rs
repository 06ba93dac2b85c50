//! Bounded per-camera frame queue
//!
//! Each camera slot owns one `FrameQueue` shared between the capture tick
//! (producer) and the recorder thread (consumer). The queue keeps at most
//! `capacity` frames; pushing beyond that evicts the oldest entry. Recording
//! must never stall live preview and preview must never block on a slow
//! writer, so overflow discards instead of applying backpressure.

use crate::capture::frame::Frame;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Default queue bound per camera
pub const DEFAULT_QUEUE_CAPACITY: usize = 500;

/// Fixed-capacity FIFO of the most recent frames from one camera
pub struct FrameQueue {
    inner: Mutex<VecDeque<Frame>>,
    capacity: usize,
}

impl FrameQueue {
    /// Create a queue holding at most `capacity` frames
    ///
    /// A zero capacity is treated as 1 so the bound always holds.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a frame, evicting the oldest entry if the queue is full
    pub fn push(&self, frame: Frame) {
        let mut queue = self.inner.lock();
        while queue.len() >= self.capacity {
            queue.pop_front();
        }
        queue.push_back(frame);
    }

    /// Remove and return the oldest frame, or `None` immediately if empty
    pub fn pop(&self) -> Option<Frame> {
        self.inner.lock().pop_front()
    }

    /// Drop all queued frames
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Number of frames currently queued
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// The queue's capacity bound
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
