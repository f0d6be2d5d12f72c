//! Fixed-Layout Record Parser
//!
//! One record is a 32-hex-character window of a datagram payload. Fields
//! live at fixed character offsets; payload bytes are interpreted as latin-1
//! text, so character offsets and byte offsets coincide.

use crate::CodecError;
use std::ops::Range;

/// Width of one record window in hex characters
pub const RECORD_HEX_CHARS: usize = 32;

/// 16-bit raw frequency value
const FREQUENCY_RAW: Range<usize> = 0..4;
/// 4-bit sensing coil identifier
const SENSING_COIL: Range<usize> = 4..5;
/// 4-bit excitation coil identifier
const EXCITATION_COIL: Range<usize> = 5..6;
/// 4-bit ADC status flag
const ADC_FLAG: Range<usize> = 6..7;
/// 4-bit over-range status flag
const OVER_RANGE_FLAG: Range<usize> = 7..8;
/// 32-bit signed in-phase sample
const IN_PHASE: Range<usize> = 8..16;
/// 32-bit frequency standard (decoded, never consumed downstream)
const FREQUENCY_STANDARD: Range<usize> = 16..24;
/// 32-bit signed quadrature sample
const QUADRATURE: Range<usize> = 24..32;

/// The eight subfields of one record window, borrowed from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFields<'a> {
    pub frequency_raw: &'a [u8],
    pub sensing_coil: &'a [u8],
    pub excitation_coil: &'a [u8],
    pub adc_flag: &'a [u8],
    pub over_range_flag: &'a [u8],
    pub in_phase: &'a [u8],
    pub frequency_standard: &'a [u8],
    pub quadrature: &'a [u8],
}

impl<'a> RecordFields<'a> {
    /// Slice a window into its eight subfields.
    ///
    /// A window shorter than [`RECORD_HEX_CHARS`] is rejected; the caller
    /// drops such trailing remainders without error.
    pub fn parse(window: &'a [u8]) -> Result<Self, CodecError> {
        if window.len() < RECORD_HEX_CHARS {
            return Err(CodecError::ShortWindow(window.len()));
        }
        Ok(Self {
            frequency_raw: &window[FREQUENCY_RAW],
            sensing_coil: &window[SENSING_COIL],
            excitation_coil: &window[EXCITATION_COIL],
            adc_flag: &window[ADC_FLAG],
            over_range_flag: &window[OVER_RANGE_FLAG],
            in_phase: &window[IN_PHASE],
            frequency_standard: &window[FREQUENCY_STANDARD],
            quadrature: &window[QUADRATURE],
        })
    }

    /// ADC flag parsed as a base-16 value
    pub fn adc_flag_value(&self) -> Result<u32, CodecError> {
        parse_hex("adc_flag", self.adc_flag)
    }

    /// Over-range flag parsed as a base-16 value
    pub fn over_range_value(&self) -> Result<u32, CodecError> {
        parse_hex("over_range_flag", self.over_range_flag)
    }
}

/// Parse a field as base-16, tagging failures with the field name.
fn parse_hex(field: &'static str, raw: &[u8]) -> Result<u32, CodecError> {
    let text = latin1_to_string(raw);
    u32::from_str_radix(&text, 16).map_err(|_| CodecError::NonHexField { field, text })
}

/// Interpret payload bytes as latin-1 text, one character per byte.
pub(crate) fn latin1_to_string(raw: &[u8]) -> String {
    raw.iter().map(|&b| b as char).collect()
}
