//! Shared Channel Buffer
//!
//! Hand-off point between the frame decoder and the chunk consumer: five
//! FIFO queues (one per decoded channel) behind a single mutex and a single
//! condition variable, drained in lockstep.

mod buffer;

pub use buffer::{ChannelBuffer, WaitOutcome};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One decoded batch: five equal-length channel sequences.
///
/// Defined here rather than in the codec crate so the buffer stays free of
/// upstream dependencies (the codec depends on the buffer, not the reverse).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelBatch {
    /// Instrument frequency in tick units (raw value x 8)
    pub frequency_ticks: Vec<i64>,
    /// Sensing coil identifiers (0-15 on the wire)
    pub sensing_coil: Vec<i32>,
    /// Excitation coil identifiers (0-15 on the wire)
    pub excitation_coil: Vec<i32>,
    /// In-phase samples scaled to [-1, 1)
    pub in_phase: Vec<f64>,
    /// Quadrature samples scaled to [-1, 1)
    pub quadrature: Vec<f64>,
}

impl ChannelBatch {
    /// Number of records in the batch (all five sequences share this length).
    pub fn record_count(&self) -> usize {
        self.frequency_ticks.len()
    }

    /// Check whether the batch carries no records
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// Truncate all five sequences to their common minimum length.
    ///
    /// A token drop upstream can leave the per-channel sequences one element
    /// apart; the queues must grow by the same count per batch.
    pub fn truncate_lockstep(&mut self) {
        let n = self
            .frequency_ticks
            .len()
            .min(self.sensing_coil.len())
            .min(self.excitation_coil.len())
            .min(self.in_phase.len())
            .min(self.quadrature.len());
        self.frequency_ticks.truncate(n);
        self.sensing_coil.truncate(n);
        self.excitation_coil.truncate(n);
        self.in_phase.truncate(n);
        self.quadrature.truncate(n);
    }
}

/// A fixed-size window dequeued together from all five queues
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub frequency_ticks: Vec<i64>,
    pub sensing_coil: Vec<i32>,
    pub excitation_coil: Vec<i32>,
    pub in_phase: Vec<f64>,
    pub quadrature: Vec<f64>,
}

impl Chunk {
    /// Elements per column
    pub fn len(&self) -> usize {
        self.frequency_ticks.len()
    }

    /// Check whether the chunk is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Errors raised by buffer operations
#[derive(Debug, Error)]
pub enum BufferError {
    /// A drain was requested for more elements than every queue holds
    #[error("drain of {needed} elements requested but a queue holds only {available}")]
    Underfilled { needed: usize, available: usize },

    /// The shared mutex was poisoned by a panicking thread
    #[error("shared buffer mutex poisoned")]
    Poisoned,
}
