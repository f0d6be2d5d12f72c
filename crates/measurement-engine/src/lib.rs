//! Measurement Engine
//!
//! Consumes fixed-size chunks from the shared channel buffer on a dedicated
//! thread, corrects the cyclic channel-phase offset ("autosync"),
//! downsamples, computes the coil-pair state index, and emits finished
//! measurement tables for persistence.

mod autosync;
mod coil;
mod consumer;
mod control;
mod table;

pub use autosync::{detect_offset, downsample, next_state, rotate_right, SYNC_WINDOW};
pub use coil::{pair_state_index, COIL_COUNT};
pub use consumer::{ChunkConsumer, EngineConfig, EngineEvent};
pub use control::EngineControl;
pub use table::MeasurementTable;
