//! Measurement File Writer

use crate::StorageError;
use measurement_engine::MeasurementTable;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::{debug, info};

/// Fixed column header of the measurement file
const HEADER: [&str; 6] = [
    "State",
    "Excitation Coil",
    "Sensing Coil",
    "Real(I)",
    "Imaginary(Q)",
    "Frequency",
];

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Measurement file path
    pub path: PathBuf,
    /// Replace an existing file instead of refusing to touch it
    pub overwrite: bool,
    /// Stop persisting after this many tables ("frames"); `None` = unlimited
    pub max_frames: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("measurements.csv"),
            overwrite: false,
            max_frames: None,
        }
    }
}

/// CSV sink for measurement tables.
///
/// Initialisation writes the header row; each table is appended afterwards.
/// Tables arriving past the frame limit are counted out silently — the
/// pipeline keeps running either way.
#[derive(Debug)]
pub struct MeasurementWriter {
    config: StorageConfig,
    frames_written: u64,
}

impl MeasurementWriter {
    /// Create the measurement file (and its parent directory) and write the
    /// header row.
    ///
    /// When `overwrite` is disabled an existing file is refused rather than
    /// truncated.
    pub fn create(config: StorageConfig) -> Result<Self, StorageError> {
        if let Some(dir) = config.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        if !config.overwrite && config.path.exists() {
            return Err(StorageError::FileExists(config.path.display().to_string()));
        }

        let mut writer = csv::Writer::from_path(&config.path)?;
        writer.write_record(HEADER)?;
        writer.flush()?;
        info!("measurement file initialised at {}", config.path.display());

        Ok(Self {
            config,
            frames_written: 0,
        })
    }

    /// Append one table as CSV rows, in the fixed column order.
    pub fn append_table(&mut self, table: &MeasurementTable) -> Result<(), StorageError> {
        if self.finished() {
            debug!(
                "frame limit reached; discarding table with {} rows",
                table.row_count()
            );
            return Ok(());
        }

        let file = OpenOptions::new().append(true).open(&self.config.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        for i in 0..table.row_count() {
            writer.write_record(&[
                table.state_index[i].to_string(),
                table.excitation_coil[i].to_string(),
                table.sensing_coil[i].to_string(),
                table.in_phase[i].to_string(),
                table.quadrature[i].to_string(),
                table.frequency[i].to_string(),
            ])?;
        }
        writer.flush()?;

        self.frames_written += 1;
        debug!(
            "appended frame {} ({} rows)",
            self.frames_written,
            table.row_count()
        );
        Ok(())
    }

    /// Number of tables persisted so far
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Whether the frame limit has been reached
    pub fn finished(&self) -> bool {
        self.config
            .max_frames
            .is_some_and(|limit| self.frames_written >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> MeasurementTable {
        MeasurementTable::from_columns(
            vec![35, 1],
            vec![3, 2],
            vec![9, 1],
            vec![0.0625, -0.125],
            vec![-0.5, 0.25],
            vec![24.0, 56.0],
        )
    }

    fn config(dir: &tempfile::TempDir, name: &str) -> StorageConfig {
        StorageConfig {
            path: dir.path().join(name),
            overwrite: false,
            max_frames: None,
        }
    }

    #[test]
    fn test_create_writes_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir, "m.csv");
        let _writer = MeasurementWriter::create(cfg.clone()).unwrap();
        let contents = std::fs::read_to_string(&cfg.path).unwrap();
        assert_eq!(
            contents.lines().next().unwrap(),
            "State,Excitation Coil,Sensing Coil,Real(I),Imaginary(Q),Frequency"
        );
    }

    #[test]
    fn test_append_writes_rows_in_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir, "m.csv");
        let mut writer = MeasurementWriter::create(cfg.clone()).unwrap();
        writer.append_table(&sample_table()).unwrap();

        let contents = std::fs::read_to_string(&cfg.path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "35,3,9,0.0625,-0.5,24");
        assert_eq!(lines[2], "1,2,1,-0.125,0.25,56");
        assert_eq!(writer.frames_written(), 1);
    }

    #[test]
    fn test_existing_file_is_refused_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir, "m.csv");
        std::fs::write(&cfg.path, "old data\n").unwrap();
        let err = MeasurementWriter::create(cfg).unwrap_err();
        assert!(matches!(err, StorageError::FileExists(_)));
    }

    #[test]
    fn test_overwrite_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(&dir, "m.csv");
        cfg.overwrite = true;
        std::fs::write(&cfg.path, "old data\n").unwrap();
        let _writer = MeasurementWriter::create(cfg.clone()).unwrap();
        let contents = std::fs::read_to_string(&cfg.path).unwrap();
        assert!(contents.starts_with("State,"));
        assert!(!contents.contains("old data"));
    }

    #[test]
    fn test_parent_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StorageConfig {
            path: dir.path().join("nested/run1/m.csv"),
            overwrite: false,
            max_frames: None,
        };
        let _writer = MeasurementWriter::create(cfg.clone()).unwrap();
        assert!(cfg.path.exists());
    }

    #[test]
    fn test_frame_limit_discards_later_tables() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(&dir, "m.csv");
        cfg.max_frames = Some(2);
        let mut writer = MeasurementWriter::create(cfg.clone()).unwrap();

        for _ in 0..4 {
            writer.append_table(&sample_table()).unwrap();
        }
        assert_eq!(writer.frames_written(), 2);
        assert!(writer.finished());

        let contents = std::fs::read_to_string(&cfg.path).unwrap();
        // Header plus two tables of two rows each.
        assert_eq!(contents.lines().count(), 5);
    }
}
