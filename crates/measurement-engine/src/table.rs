//! Measurement Table
//!
//! The emitted result of one consumed chunk: six parallel columns, handed by
//! value to the storage collaborator and then forgotten by the pipeline.

use serde::{Deserialize, Serialize};

/// Row-table of finished measurements. Column order is fixed and matches the
/// persisted file layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementTable {
    /// Coil-pair state index
    pub state_index: Vec<i32>,
    /// Excitation coil identifier
    pub excitation_coil: Vec<i32>,
    /// Sensing coil identifier
    pub sensing_coil: Vec<i32>,
    /// In-phase sample
    pub in_phase: Vec<f64>,
    /// Quadrature sample
    pub quadrature: Vec<f64>,
    /// Frequency
    pub frequency: Vec<f64>,
}

impl MeasurementTable {
    /// Assemble a table from the six post-processing columns, truncating
    /// every column to the shortest length so all rows are complete.
    pub fn from_columns(
        mut state_index: Vec<i32>,
        mut excitation_coil: Vec<i32>,
        mut sensing_coil: Vec<i32>,
        mut in_phase: Vec<f64>,
        mut quadrature: Vec<f64>,
        mut frequency: Vec<f64>,
    ) -> Self {
        let rows = state_index
            .len()
            .min(excitation_coil.len())
            .min(sensing_coil.len())
            .min(in_phase.len())
            .min(quadrature.len())
            .min(frequency.len());
        state_index.truncate(rows);
        excitation_coil.truncate(rows);
        sensing_coil.truncate(rows);
        in_phase.truncate(rows);
        quadrature.truncate(rows);
        frequency.truncate(rows);
        Self {
            state_index,
            excitation_coil,
            sensing_coil,
            in_phase,
            quadrature,
            frequency,
        }
    }

    /// Number of complete rows
    pub fn row_count(&self) -> usize {
        self.state_index.len()
    }

    /// Check whether the table holds no rows
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}
