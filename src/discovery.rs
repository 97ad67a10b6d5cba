use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CycleError, CycleResult};

/// List CSV record files whose names contain both keywords, case-insensitive.
/// Sorted so records are always processed in the same order.
pub fn find_records(data_path: &Path, data_source: &str, condition: &str) -> CycleResult<Vec<PathBuf>> {
    let data_source = data_source.to_lowercase();
    let condition = condition.to_lowercase();

    let entries = fs::read_dir(data_path).map_err(|e| {
        CycleError::Storage(format!("failed to read data directory {}: {e}", data_path.display()))
    })?;

    let mut records = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            CycleError::Storage(format!("failed to read data directory {}: {e}", data_path.display()))
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_lowercase(),
            None => continue,
        };
        if name.ends_with(".csv") && name.contains(&data_source) && name.contains(&condition) {
            records.push(path);
        }
    }

    records.sort();
    Ok(records)
}
