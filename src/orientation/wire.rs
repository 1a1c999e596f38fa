//! Orientation datagram decoding
//!
//! Each datagram carries one fixed little-endian record:
//!
//! | offset | type  | field                      |
//! |--------|-------|----------------------------|
//! | 0      | f32   | azimuth, radians           |
//! | 4      | f32   | pitch, radians (optional)  |
//!
//! Trailing bytes beyond the record are ignored.

use bytes::{Buf, BufMut};
use thiserror::Error;

/// Bytes needed for the azimuth field alone
pub const AZIMUTH_LEN: usize = 4;

/// Bytes needed for azimuth plus pitch
pub const FULL_RECORD_LEN: usize = 8;

/// Receive buffer size for one datagram
pub const RECV_BUFFER_LEN: usize = 256;

/// Why a datagram was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("message too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("non-finite {0} value")]
    NonFinite(&'static str),
}

/// One decoded orientation reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationMessage {
    /// Raw azimuth, may be negative
    pub azimuth: f32,
    pub pitch: Option<f32>,
}

impl OrientationMessage {
    /// Decode a datagram payload
    pub fn decode(mut payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.len() < AZIMUTH_LEN {
            return Err(DecodeError::TooShort {
                expected: AZIMUTH_LEN,
                actual: payload.len(),
            });
        }

        let azimuth = payload.get_f32_le();
        if !azimuth.is_finite() {
            return Err(DecodeError::NonFinite("azimuth"));
        }

        let pitch = if payload.remaining() >= 4 {
            let pitch = payload.get_f32_le();
            if !pitch.is_finite() {
                return Err(DecodeError::NonFinite("pitch"));
            }
            Some(pitch)
        } else {
            None
        };

        Ok(Self { azimuth, pitch })
    }

    /// Encode into the wire layout
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FULL_RECORD_LEN);
        out.put_f32_le(self.azimuth);
        if let Some(pitch) = self.pitch {
            out.put_f32_le(pitch);
        }
        out
    }
}
