//! Cross-module tests
//!
//! - Orientation ingest over a real localhost socket
//! - Concurrent push/read safety of the shared buffer
//! - Caption timing and the full frame pipeline

pub mod udp;
