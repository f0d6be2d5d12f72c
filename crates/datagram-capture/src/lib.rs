//! Datagram Capture
//!
//! Binds the instrument-facing UDP socket and assembles pending datagrams
//! into decode batches. Outbound configuration traffic is not handled here;
//! this side of the transport only listens.

mod capture;

pub use capture::{CaptureConfig, DatagramCapture, MAX_DATAGRAM_BYTES};

use thiserror::Error;

/// Capture errors
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Socket bind or receive failure
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),
}
