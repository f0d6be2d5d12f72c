//! Chunk Consumer Loop

use crate::autosync::{detect_offset, downsample, next_state, rotate_right};
use crate::coil::pair_state_index;
use crate::control::EngineControl;
use crate::table::MeasurementTable;
use channel_buffer::{ChannelBuffer, Chunk, WaitOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Elements dequeued per channel per iteration
pub const DEFAULT_CHUNK_LEN: usize = 480;

/// Cancellation re-check interval while waiting for a full chunk
pub const DEFAULT_WAIT_POLL_MS: u64 = 100;

/// Consumer loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Elements drained from every queue per iteration
    pub chunk_len: usize,
    /// Poll interval of the chunk wait, in milliseconds
    pub wait_poll_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_len: DEFAULT_CHUNK_LEN,
            wait_poll_ms: DEFAULT_WAIT_POLL_MS,
        }
    }
}

/// Display-facing updates emitted once per consumed chunk
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Current autosync state in [0, 4]
    AutosyncUpdated(i32),
    /// First frequency value of the downsampled chunk, 0 when absent
    FrequencyUpdated(f64),
}

/// The consumer side of the pipeline.
///
/// Runs on its own thread: blocks until every queue holds a full chunk,
/// drains it, applies the autosync correction, downsamples, labels each
/// position with its coil-pair state index, and emits a finished
/// measurement table.
pub struct ChunkConsumer {
    buffer: Arc<ChannelBuffer>,
    control: Arc<EngineControl>,
    config: EngineConfig,
    /// Persistent cyclic offset in [0, 4]; sticky until a detection run
    /// finds a phase break
    autosync: i32,
    events: mpsc::UnboundedSender<EngineEvent>,
    tables: mpsc::UnboundedSender<MeasurementTable>,
}

impl ChunkConsumer {
    /// Create a consumer over `buffer`, reporting through the two channels
    pub fn new(
        buffer: Arc<ChannelBuffer>,
        control: Arc<EngineControl>,
        config: EngineConfig,
        events: mpsc::UnboundedSender<EngineEvent>,
        tables: mpsc::UnboundedSender<MeasurementTable>,
    ) -> Self {
        Self {
            buffer,
            control,
            config,
            autosync: 0,
            events,
            tables,
        }
    }

    /// Run until a stop is requested. A stop observed mid-wait abandons the
    /// iteration; a completed drain always runs to table emission.
    pub fn run(mut self) {
        info!(
            "chunk consumer started (chunk_len={}, poll={}ms)",
            self.config.chunk_len, self.config.wait_poll_ms
        );
        let poll = Duration::from_millis(self.config.wait_poll_ms);

        while !self.control.stop_requested() {
            let outcome =
                self.buffer
                    .wait_for_chunk(self.config.chunk_len, poll, self.control.stop_flag());
            if outcome == WaitOutcome::Cancelled {
                break;
            }
            let chunk = match self.buffer.drain(self.config.chunk_len) {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!("chunk drain failed: {e}");
                    continue;
                }
            };
            self.process_chunk(chunk);
        }
        info!("chunk consumer stopped");
    }

    fn process_chunk(&mut self, mut chunk: Chunk) {
        // The sync request is consumed exactly once per iteration, whether
        // or not detection finds a phase break.
        if self.control.take_sync_request() {
            if let Some(k) = detect_offset(&chunk.sensing_coil) {
                self.autosync = next_state(k);
                debug!("autosync realigned to {}", self.autosync);
            }
        }
        let _ = self
            .events
            .send(EngineEvent::AutosyncUpdated(self.autosync));

        if self.autosync > 0 {
            let offset = self.autosync as usize;
            rotate_right(&mut chunk.frequency_ticks, offset);
            rotate_right(&mut chunk.sensing_coil, offset);
            rotate_right(&mut chunk.excitation_coil, offset);
            rotate_right(&mut chunk.in_phase, offset);
            rotate_right(&mut chunk.quadrature, offset);
        }

        let frequency_ticks = downsample(&chunk.frequency_ticks);
        let sensing = downsample(&chunk.sensing_coil);
        let excitation = downsample(&chunk.excitation_coil);
        let in_phase = downsample(&chunk.in_phase);
        let quadrature = downsample(&chunk.quadrature);

        let current_frequency = frequency_ticks.first().map(|&v| v as f64).unwrap_or(0.0);
        let _ = self
            .events
            .send(EngineEvent::FrequencyUpdated(current_frequency));

        let state_index: Vec<i32> = sensing
            .iter()
            .zip(&excitation)
            .map(|(&s, &e)| pair_state_index(s, e))
            .collect();
        let frequency: Vec<f64> = frequency_ticks.iter().map(|&v| v as f64).collect();

        let table = MeasurementTable::from_columns(
            state_index,
            excitation,
            sensing,
            in_phase,
            quadrature,
            frequency,
        );
        debug!("assembled measurement table with {} rows", table.row_count());
        if self.tables.send(table).is_err() {
            warn!("measurement table receiver dropped");
        }
    }
}
