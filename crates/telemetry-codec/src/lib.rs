//! Telemetry Frame Codec
//!
//! Decodes the instrument's hex-encoded datagram payloads into five typed
//! per-channel streams and deposits them in the shared channel buffer. The
//! wire convention includes a character-level reversal of the encoded line;
//! see [`decoder`] for the full transform.

mod decoder;
mod error;
mod record;

pub use decoder::{decode_streams, BatchDiagnostics, FrameDecoder};
pub use error::CodecError;
pub use record::{RecordFields, RECORD_HEX_CHARS};
