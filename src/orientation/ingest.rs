//! Orientation ingest worker
//!
//! Receives one datagram at a time, decodes it, and pushes the reading
//! into the shared [`OrientationBuffer`]. Runs on a dedicated thread until
//! the stop flag is raised or the source fails terminally.

use std::f64::consts::FRAC_PI_2;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{CaptionError, Result};
use crate::orientation::buffer::OrientationBuffer;
use crate::orientation::wire::{OrientationMessage, RECV_BUFFER_LEN};
use crate::signal::StopFlag;

/// A blocking source of orientation datagrams
pub trait DatagramSource: Send {
    /// Receive one datagram into `buf`, returning its length
    fn recv_datagram(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl DatagramSource for UdpSocket {
    fn recv_datagram(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.recv_from(buf).map(|(len, _)| len)
    }
}

/// Bind the orientation socket.
///
/// The read timeout bounds how long the worker can sit in `recv` before it
/// notices a stop request.
pub fn bind_socket(addr: SocketAddr, poll_interval: Duration) -> Result<UdpSocket> {
    let socket = UdpSocket::bind(addr)?;
    socket.set_read_timeout(Some(poll_interval))?;
    Ok(socket)
}

/// How a receive error affects the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Nothing arrived within the poll interval
    Idle,
    /// One call failed; keep receiving
    Transient,
    /// The source is gone
    Terminal,
}

pub fn classify(err: &io::Error) -> ErrorClass {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted => {
            ErrorClass::Idle
        }
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionAborted => ErrorClass::Transient,
        _ => ErrorClass::Terminal,
    }
}

/// Why the worker stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestExit {
    Stopped,
    SourceFailed(String),
}

/// Counters reported when the worker exits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub accepted: u64,
    pub dropped: u64,
    pub transient_errors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub exit: IngestExit,
    pub stats: IngestStats,
}

/// Ingest worker state
pub struct OrientationIngest<S> {
    source: S,
    buffer: Arc<OrientationBuffer>,
    stop: StopFlag,
    stats: IngestStats,
}

impl<S: DatagramSource> OrientationIngest<S> {
    pub fn new(source: S, buffer: Arc<OrientationBuffer>, stop: StopFlag) -> Self {
        Self {
            source,
            buffer,
            stop,
            stats: IngestStats::default(),
        }
    }

    /// Decode one payload and push it. Rejected payloads leave the buffer
    /// untouched.
    pub fn handle_datagram(&mut self, payload: &[u8]) -> bool {
        match OrientationMessage::decode(payload) {
            Ok(msg) => {
                let azimuth = f64::from(msg.azimuth);
                match msg.pitch {
                    Some(pitch) => self
                        .buffer
                        .push_with_pitch(azimuth, f64::from(pitch) + FRAC_PI_2),
                    None => self.buffer.push(azimuth),
                }
                self.stats.accepted += 1;
                true
            }
            Err(e) => {
                self.stats.dropped += 1;
                tracing::debug!("Dropping orientation datagram: {}", e);
                false
            }
        }
    }

    /// Receive until stopped or the source fails terminally
    pub fn run(mut self) -> IngestReport {
        let mut buf = [0u8; RECV_BUFFER_LEN];
        tracing::info!("Orientation ingest started");

        let exit = loop {
            if self.stop.is_stopped() {
                break IngestExit::Stopped;
            }

            match self.source.recv_datagram(&mut buf) {
                Ok(len) => {
                    self.handle_datagram(&buf[..len]);
                }
                Err(e) => match classify(&e) {
                    ErrorClass::Idle => {}
                    ErrorClass::Transient => {
                        self.stats.transient_errors += 1;
                        tracing::warn!("recvfrom failed: {}", e);
                    }
                    ErrorClass::Terminal => {
                        tracing::error!("Orientation source closed: {}", e);
                        break IngestExit::SourceFailed(e.to_string());
                    }
                },
            }
        };

        tracing::info!(
            accepted = self.stats.accepted,
            dropped = self.stats.dropped,
            transient_errors = self.stats.transient_errors,
            "Orientation ingest exited: {:?}",
            exit
        );
        IngestReport {
            exit,
            stats: self.stats,
        }
    }
}

/// Handle to a running ingest thread
pub struct IngestHandle {
    handle: JoinHandle<IngestReport>,
    stop: StopFlag,
}

impl IngestHandle {
    /// Spawn the worker on a named thread
    pub fn spawn<S>(ingest: OrientationIngest<S>) -> Result<Self>
    where
        S: DatagramSource + 'static,
    {
        let stop = ingest.stop.clone();
        let handle = thread::Builder::new()
            .name("orientation-ingest".to_string())
            .spawn(move || ingest.run())
            .map_err(|e| CaptionError::Thread(format!("spawn orientation-ingest: {}", e)))?;
        Ok(Self { handle, stop })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Raise the stop flag and wait for the worker
    pub fn stop_and_join(self) -> Result<IngestReport> {
        self.stop.stop();
        self.join()
    }

    pub fn join(self) -> Result<IngestReport> {
        self.handle
            .join()
            .map_err(|_| CaptionError::Thread("orientation-ingest panicked".to_string()))
    }
}
