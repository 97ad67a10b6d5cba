use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::warn;

use crate::error::{CycleError, CycleResult};
use crate::types::{CycleArtifact, DetectionParameters, LastParameters};

const LAST_PARAMETERS_FILE: &str = "last_parameters.json";
const PROCESSED_LOG_FILE: &str = "processed_records.log";

/// Durable store for detection results. Sole writer of the output directory:
/// per-record cycle artifacts, the last-used parameter seed, and the
/// append-only processing log all live here.
pub struct CycleStore {
    output_dir: PathBuf,
}

impl CycleStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> CycleResult<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|e| {
            CycleError::Storage(format!(
                "failed to create output directory {}: {e}",
                output_dir.display()
            ))
        })?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn cycles_file_name(record_name: &str) -> String {
        format!("{record_name}_cycles.json")
    }

    fn cycles_path(&self, record_name: &str) -> PathBuf {
        self.output_dir.join(Self::cycles_file_name(record_name))
    }

    /// The reprocessing gate probe: a record counts as processed exactly when
    /// its cycle artifact exists.
    pub fn has_been_processed(&self, record_name: &str) -> bool {
        self.cycles_path(record_name).is_file()
    }

    /// Write the per-record cycle artifact. Returns the path written.
    pub fn save_cycle_data(
        &self,
        record_name: &str,
        parameters: &DetectionParameters,
        cycle_indices: &[usize],
    ) -> CycleResult<PathBuf> {
        let artifact = CycleArtifact {
            record_name: record_name.to_string(),
            detection_parameters: parameters.clone(),
            cycle_indices: cycle_indices.to_vec(),
            timestamp: Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&artifact).map_err(|e| {
            CycleError::Storage(format!("failed to encode cycle data for '{record_name}': {e}"))
        })?;
        let path = self.cycles_path(record_name);
        fs::write(&path, json).map_err(|e| {
            CycleError::Storage(format!("failed to save cycle data for '{record_name}': {e}"))
        })?;
        Ok(path)
    }

    pub fn load_cycle_data(&self, record_name: &str) -> CycleResult<CycleArtifact> {
        let path = self.cycles_path(record_name);
        let text = fs::read_to_string(&path).map_err(|e| {
            CycleError::Storage(format!("failed to read cycle data for '{record_name}': {e}"))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            CycleError::Storage(format!("failed to parse cycle data for '{record_name}': {e}"))
        })
    }

    /// Append one provenance row: record name, completion time, artifact file
    /// name, and the parameters as JSON text.
    pub fn log_processed_record(
        &self,
        record_name: &str,
        parameters: &DetectionParameters,
    ) -> CycleResult<()> {
        let path = self.output_dir.join(PROCESSED_LOG_FILE);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                CycleError::Storage(format!("failed to open {}: {e}", path.display()))
            })?;

        let parameters_json = serde_json::to_string(parameters).map_err(|e| {
            CycleError::Storage(format!("failed to encode parameters for '{record_name}': {e}"))
        })?;

        let timestamp = Utc::now().to_rfc3339();
        let cycles_file = Self::cycles_file_name(record_name);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer
            .write_record([
                record_name,
                timestamp.as_str(),
                cycles_file.as_str(),
                parameters_json.as_str(),
            ])
            .and_then(|_| writer.flush().map_err(Into::into))
            .map_err(|e| {
                CycleError::Storage(format!("failed to log processed record '{record_name}': {e}"))
            })
    }

    /// Overwrite the last-used parameter seed.
    pub fn save_last_parameters(&self, parameters: &LastParameters) -> CycleResult<PathBuf> {
        let path = self.output_dir.join(LAST_PARAMETERS_FILE);
        let json = serde_json::to_string_pretty(parameters).map_err(|e| {
            CycleError::Storage(format!("failed to encode last parameters: {e}"))
        })?;
        fs::write(&path, json).map_err(|e| {
            CycleError::Storage(format!("failed to save last parameters: {e}"))
        })?;
        Ok(path)
    }

    /// Last-used parameters, or the defaults when absent or unreadable.
    pub fn load_last_parameters(&self) -> LastParameters {
        let path = self.output_dir.join(LAST_PARAMETERS_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(_) => return LastParameters::default(),
        };
        match serde_json::from_str(&text) {
            Ok(parameters) => parameters,
            Err(e) => {
                warn!("failed to parse {}: {e}", path.display());
                LastParameters::default()
            }
        }
    }
}
