//! Decoded frame types
//!
//! A `Frame` is one decoded image at the fixed session resolution. Frames are
//! immutable once produced; the pixel payload lives behind `Bytes` so a frame
//! can be handed to both the preview sink and the frame queue without copying.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Video resolution in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Size in bytes of one BGR24 frame at this resolution
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One decoded frame from a capture source
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data (BGR24, tightly packed)
    pub data: Bytes,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Capture timestamp in milliseconds since the source was opened
    pub timestamp_ms: f64,
}

impl Frame {
    /// Create a frame from raw pixel data
    pub fn new(data: Bytes, resolution: Resolution, timestamp_ms: f64) -> Self {
        Self {
            data,
            width: resolution.width,
            height: resolution.height,
            timestamp_ms,
        }
    }

    /// Resolution of this frame
    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }
}
