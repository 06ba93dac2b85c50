//! Recording sessions
//!
//! The `SessionController` owns every camera slot (source, queue, recorder)
//! and exposes the synchronous command API a front end drives: register
//! cameras, tick the capture loop, start/stop recording, shut down.

pub mod config;
pub mod controller;

pub use config::SessionConfig;
pub use controller::SessionController;

/// Identity of a camera slot: its index in registration order
pub type SlotId = usize;
