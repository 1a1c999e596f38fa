//! Orientation-following speaker captions
//!
//! Receives head orientation over UDP, stabilizes it, projects it onto
//! screen pixels and places the current caption either pinned under its
//! speaker or following the viewer's gaze.

pub mod captions;
pub mod cli;
pub mod config;
pub mod config_file;
pub mod error;
pub mod orientation;
pub mod presenter;
pub mod projection;
pub mod session;
pub mod signal;

#[cfg(test)]
pub(crate) mod tests;

pub use config::SessionConfig;
pub use error::{CaptionError, Result};
pub use session::{FrameDriver, Session, SessionReport};
