//! Codec Error Types

use thiserror::Error;

/// Errors raised while decoding telemetry frames.
///
/// None of these abort a batch: a short trailing window yields no record and
/// a non-hex field is logged and skipped.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A record window shorter than the fixed record width
    #[error("record window holds {0} characters, expected 32")]
    ShortWindow(usize),

    /// A field that failed to parse as base-16
    #[error("field `{field}` is not hexadecimal: {text:?}")]
    NonHexField { field: &'static str, text: String },
}
