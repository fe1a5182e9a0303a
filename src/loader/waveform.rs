use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::domain::cycle::Waveform;
use crate::error::{Error, Result};

/// Column holding the time axis in the logging exports of the main-bend current.
pub const DEFAULT_X_KEY: &str = "logical.MBI/IMAINS";
/// Column holding the current; the exports repeat the header, hence the suffix.
pub const DEFAULT_Y_KEY: &str = "logical.MBI/IMAINS.1";

/// Where a cycle's waveform lives and which columns to read.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformRef {
    pub file: String,
    pub x_key: String,
    pub y_key: String,
}

impl WaveformRef {
    pub fn new(file: impl Into<String>) -> Self {
        WaveformRef { file: file.into(), x_key: DEFAULT_X_KEY.to_string(), y_key: DEFAULT_Y_KEY.to_string() }
    }
}

/// Data source for measured cycle waveforms.
pub trait WaveformSource {
    /// Returns the `(x, y)` columns of `file` as floats.
    fn load(&self, file: &str, x_key: &str, y_key: &str) -> Result<Waveform>;
}

/// Reads waveforms from CSV exports, resolving relative paths against `base_dir`.
#[derive(Debug, Clone, Default)]
pub struct CsvWaveformSource {
    base_dir: PathBuf,
}

impl CsvWaveformSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        CsvWaveformSource { base_dir: base_dir.into() }
    }

    fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() { path.to_path_buf() } else { self.base_dir.join(path) }
    }
}

impl WaveformSource for CsvWaveformSource {
    fn load(&self, file: &str, x_key: &str, y_key: &str) -> Result<Waveform> {
        let path = self.resolve(file);
        let reader = File::open(&path).map_err(|e| Error::DataSourceError { file: path.display().to_string(), message: e.to_string() })?;
        load_cycle_from_csv(reader, &path.display().to_string(), x_key, y_key)
    }
}

/// Parses a waveform export.
///
/// The first data row carries units and is dropped. Every remaining value must
/// parse as a float; blank cells and cells missing from short rows become NaN.
/// Repeated header names are numbered `name`, `name.1`, ...
pub fn load_cycle_from_csv<R: Read>(reader: R, file: &str, x_key: &str, y_key: &str) -> Result<Waveform> {
    let source_error = |message: String| Error::DataSourceError { file: file.to_string(), message };

    let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).flexible(true).trim(csv::Trim::All).from_reader(reader);

    let headers = csv_reader.headers().map_err(|e| source_error(e.to_string()))?;
    let headers = mangle_duplicate_headers(headers.iter());

    let x_index = headers.iter().position(|h| h == x_key).ok_or_else(|| source_error(format!("missing column '{}'", x_key)))?;
    let y_index = headers.iter().position(|h| h == y_key).ok_or_else(|| source_error(format!("missing column '{}'", y_key)))?;

    let mut x = Vec::new();
    let mut y = Vec::new();

    for (row, record) in csv_reader.records().enumerate().skip(1) {
        let record = record.map_err(|e| source_error(e.to_string()))?;

        let mut values = Vec::with_capacity(record.len());
        for (column, field) in record.iter().enumerate() {
            if field.is_empty() {
                values.push(f64::NAN);
                continue;
            }
            let value = field.parse::<f64>().map_err(|_| source_error(format!("row {}: value '{}' in column '{}' is not a number", row + 1, field, headers.get(column).map_or("?", String::as_str))))?;
            values.push(value);
        }

        x.push(values.get(x_index).copied().unwrap_or(f64::NAN));
        y.push(values.get(y_index).copied().unwrap_or(f64::NAN));
    }

    Waveform::new(x, y)
}

fn mangle_duplicate_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut result = Vec::new();

    for header in headers {
        let count = seen.entry(header.to_string()).or_insert(0);
        if *count == 0 {
            result.push(header.to_string());
        } else {
            result.push(format!("{}.{}", header, count));
        }
        *count += 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "logical.MBI/IMAINS,logical.MBI/IMAINS\ns,A\n0.0,100.0\n0.5,2500.5\n1.0,150.0\n";

    #[test]
    fn test_drops_units_row_and_reads_duplicate_columns() {
        let waveform = load_cycle_from_csv(EXPORT.as_bytes(), "zero.csv", DEFAULT_X_KEY, DEFAULT_Y_KEY).unwrap();
        assert_eq!(waveform.x, vec![0.0, 0.5, 1.0]);
        assert_eq!(waveform.y, vec![100.0, 2500.5, 150.0]);
    }

    #[test]
    fn test_missing_column_is_a_data_source_error() {
        let result = load_cycle_from_csv(EXPORT.as_bytes(), "zero.csv", "time", DEFAULT_Y_KEY);
        assert!(matches!(result, Err(Error::DataSourceError { .. })));
    }

    #[test]
    fn test_non_numeric_value_is_a_data_source_error() {
        let data = "t,i\ns,A\n0.0,abc\n";
        let result = load_cycle_from_csv(data.as_bytes(), "bad.csv", "t", "i");
        match result {
            Err(Error::DataSourceError { file, message }) => {
                assert_eq!(file, "bad.csv");
                assert!(message.contains("abc"));
            }
            other => panic!("Expected DataSourceError, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_and_missing_cells_are_nan() {
        let data = "t,i,v\ns,A,V\n0.0,1.0,5.0\n1.2,,5.0\n2.4\n";
        let waveform = load_cycle_from_csv(data.as_bytes(), "gaps.csv", "t", "i").unwrap();

        assert_eq!(waveform.len(), 3);
        assert_eq!(waveform.x, vec![0.0, 1.2, 2.4]);
        assert_eq!(waveform.y[0], 1.0);
        assert!(waveform.y[1].is_nan());
        assert!(waveform.y[2].is_nan());
    }

    #[test]
    fn test_header_mangling() {
        let mangled = mangle_duplicate_headers(["a", "b", "a", "a"].into_iter());
        assert_eq!(mangled, vec!["a", "b", "a.1", "a.2"]);
    }

    #[test]
    fn test_missing_file_is_a_data_source_error() {
        let source = CsvWaveformSource::new("/nonexistent-directory");
        let result = source.load("missing.csv", DEFAULT_X_KEY, DEFAULT_Y_KEY);
        assert!(matches!(result, Err(Error::DataSourceError { .. })));
    }
}
