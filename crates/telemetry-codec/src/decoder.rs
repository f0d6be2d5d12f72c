//! Frame Decoder
//!
//! Turns a batch of raw datagram payloads into the five typed channel
//! streams and a set of display diagnostics, then deposits the streams in
//! the shared channel buffer.
//!
//! The instrument's wire convention reverses the concatenated encoded line
//! character-by-character; the parsed token list is then reversed a second
//! time at the list level. Token order ends up matching the original field
//! order, but the hex digits inside each multi-digit field stay reversed
//! relative to their natural value. This is reproduced bit-exactly and must
//! not be "corrected" without instrument-side confirmation.

use crate::record::{latin1_to_string, RecordFields, RECORD_HEX_CHARS};
use channel_buffer::{ChannelBatch, ChannelBuffer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, warn};

/// Full-scale divisor for in-phase/quadrature samples (2^31)
const AMPLITUDE_SCALE: f64 = 2_147_483_648.0;

/// Display-facing summary of one decoded batch.
///
/// Consumed by the display collaborator only; the chunk consumer never sees
/// any of these fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchDiagnostics {
    /// True when the sum of all per-record over-range flags is nonzero
    pub over_range: bool,
    /// Statistical mode of the per-record ADC flags; 0 when the maximum
    /// frequency is tied among distinct values or no value repeats
    pub adc_mode: u32,
    /// Records decoded from the batch
    pub records: usize,
    /// The character-reversed encoded line, as the instrument presents it
    pub encoded_line: String,
}

/// Decode a batch of datagram payloads into channel streams plus
/// diagnostics, without touching the shared buffer.
///
/// Payloads are walked in non-overlapping 32-character windows; a trailing
/// remainder shorter than one window is dropped. Tokens that fail base-16
/// parsing are logged and skipped; everything else in the batch survives.
pub fn decode_streams(batch: &[Vec<u8>]) -> (ChannelBatch, BatchDiagnostics) {
    let mut encoded = String::new();
    let mut adc_flags = Vec::new();
    let mut over_range_flags = Vec::new();

    for payload in batch {
        let mut offset = 0;
        while offset + RECORD_HEX_CHARS <= payload.len() {
            let window = &payload[offset..offset + RECORD_HEX_CHARS];
            offset += RECORD_HEX_CHARS;
            if let Ok(fields) = RecordFields::parse(window) {
                match fields.adc_flag_value() {
                    Ok(value) => adc_flags.push(value),
                    Err(e) => warn!("skipping ADC flag: {e}"),
                }
                match fields.over_range_value() {
                    Ok(value) => over_range_flags.push(value),
                    Err(e) => warn!("skipping over-range flag: {e}"),
                }
                let _ = write!(
                    encoded,
                    "{},{},{},{};{},{};",
                    latin1_to_string(fields.frequency_raw),
                    latin1_to_string(fields.sensing_coil),
                    latin1_to_string(fields.excitation_coil),
                    latin1_to_string(fields.in_phase),
                    latin1_to_string(fields.frequency_standard),
                    latin1_to_string(fields.quadrature),
                );
            }
        }
    }

    // Character-level reversal of the whole encoded line (wire convention),
    // followed further down by a list-level reversal of the parsed tokens.
    let encoded_line: String = encoded.chars().rev().collect();

    let mut values: Vec<i32> = Vec::new();
    for token in encoded_line.split([',', ';']).filter(|t| !t.is_empty()) {
        match u32::from_str_radix(token, 16) {
            Ok(value) => values.push(value as i32),
            Err(_) => warn!("dropping non-hex token {:?}", token),
        }
    }
    values.reverse();

    // Partition by position modulo 6, in cyclic order: frequency, sensing,
    // excitation, in-phase, frequency standard (unused), quadrature.
    let mut channels: [Vec<i32>; 6] = Default::default();
    for (i, value) in values.into_iter().enumerate() {
        channels[i % 6].push(value);
    }

    let mut streams = ChannelBatch {
        frequency_ticks: channels[0].iter().map(|&v| i64::from(v) * 8).collect(),
        sensing_coil: std::mem::take(&mut channels[1]),
        excitation_coil: std::mem::take(&mut channels[2]),
        in_phase: channels[3]
            .iter()
            .map(|&v| f64::from(v) / AMPLITUDE_SCALE)
            .collect(),
        quadrature: channels[5]
            .iter()
            .map(|&v| f64::from(v) / AMPLITUDE_SCALE)
            .collect(),
    };
    streams.truncate_lockstep();

    let over_range = over_range_flags.iter().map(|&v| u64::from(v)).sum::<u64>() > 0;
    let diagnostics = BatchDiagnostics {
        over_range,
        adc_mode: flag_mode(&adc_flags),
        records: streams.record_count(),
        encoded_line,
    };
    (streams, diagnostics)
}

/// Statistical mode of the ADC flags.
///
/// Reports 0 unless one value is the unique maximum and occurs more than
/// once; an ambiguous mode never resolves to an arbitrary candidate.
fn flag_mode(flags: &[u32]) -> u32 {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for &flag in flags {
        *counts.entry(flag).or_insert(0) += 1;
    }

    let mut mode_value = 0u32;
    let mut max_count = 0usize;
    let mut candidates = 0usize;
    for (&value, &count) in &counts {
        if count > max_count {
            max_count = count;
            mode_value = value;
            candidates = 1;
        } else if count == max_count {
            candidates += 1;
        }
    }

    if max_count > 1 && candidates == 1 {
        mode_value
    } else {
        0
    }
}

/// Stateless-per-call decoder bound to the shared channel buffer.
pub struct FrameDecoder {
    buffer: Arc<ChannelBuffer>,
}

impl FrameDecoder {
    /// Create a decoder depositing into `buffer`
    pub fn new(buffer: Arc<ChannelBuffer>) -> Self {
        Self { buffer }
    }

    /// Decode a batch, append the five streams to the shared buffer (waking
    /// any blocked consumer), and return the display diagnostics.
    ///
    /// An empty batch appends five empty streams, which is a harmless no-op.
    pub fn decode(&self, batch: &[Vec<u8>]) -> BatchDiagnostics {
        let (streams, diagnostics) = decode_streams(batch);
        debug!(
            "decoded {} records from {} datagrams",
            diagnostics.records,
            batch.len()
        );
        if let Err(e) = self.buffer.append(streams) {
            warn!("failed to append decoded batch: {e}");
        }
        diagnostics
    }
}
