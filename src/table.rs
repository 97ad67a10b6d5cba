use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{CycleError, CycleResult};

/// In-memory tabular record: named float columns of equal length.
#[derive(Debug)]
pub struct RecordTable {
    headers: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl RecordTable {
    /// Load a CSV record file with a header row.
    pub fn from_csv(path: &Path) -> CycleResult<Self> {
        let file = File::open(path).map_err(|e| {
            CycleError::Storage(format!("failed to load data from {}: {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(file))
            .map_err(|e| CycleError::Storage(format!("failed to load data from {}: {e}", path.display())))
    }

    fn from_reader(reader: impl Read) -> Result<Self, String> {
        let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| e.to_string())?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
        for (row_idx, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|e| e.to_string())?;
            if record.len() != headers.len() {
                return Err(format!(
                    "row {} has {} fields, expected {}",
                    row_idx + 1,
                    record.len(),
                    headers.len()
                ));
            }
            for (col, field) in record.iter().enumerate() {
                let value: f64 = field.trim().parse().map_err(|_| {
                    format!("row {} column '{}' is not numeric: '{}'", row_idx + 1, headers[col], field)
                })?;
                columns[col].push(value);
            }
        }

        Ok(Self { headers, columns })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.headers
            .iter()
            .position(|h| h == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }
}

/// Record name derived from a file name, extension stripped.
pub fn record_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_csv_columns() {
        let file = write_temp_csv("NeckFlexion_C3d_Position,Velocity\n0.1,0.01\n0.2,0.02\n0.3,0.03\n");
        let table = RecordTable::from_csv(file.path()).unwrap();

        assert!(table.has_column("NeckFlexion_C3d_Position"));
        assert!(table.has_column("Velocity"));
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.column("NeckFlexion_C3d_Position").unwrap()[0], 0.1);
        assert_eq!(table.column("Velocity").unwrap()[1], 0.02);
        assert!(table.column("Missing").is_none());
    }

    #[test]
    fn test_load_csv_non_numeric_cell() {
        let file = write_temp_csv("Position\n0.1\nnot_a_number\n");
        let err = RecordTable::from_csv(file.path()).unwrap_err();
        assert!(matches!(err, CycleError::Storage(_)));
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = RecordTable::from_csv(Path::new("/nonexistent/file.csv")).unwrap_err();
        assert!(matches!(err, CycleError::Storage(_)));
    }

    #[test]
    fn test_record_name_strips_extension() {
        assert_eq!(record_name(Path::new("/data/session1_c3d_walk.csv")), "session1_c3d_walk");
        assert_eq!(record_name(Path::new("plain")), "plain");
    }
}
