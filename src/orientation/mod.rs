//! Orientation pipeline
//!
//! - Shared angular sample buffer
//! - Datagram decoding and the ingest worker
//! - Filter policies producing a stabilized angle

pub mod buffer;
pub mod filter;
pub mod ingest;
pub mod wire;

pub use buffer::{normalize_azimuth, OrientationBuffer, SampleWindow, DEFAULT_CAPACITY};
pub use filter::{ExponentialParams, FilterPolicy, GateSample, OrientationFilter};
pub use ingest::{bind_socket, DatagramSource, IngestExit, IngestHandle, IngestReport, OrientationIngest};
pub use wire::OrientationMessage;
