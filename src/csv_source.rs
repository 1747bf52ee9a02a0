use crate::churn_record::ChurnRecord;
use crate::data_source::{normalize_column_name, parse_age, ChurnSource, ColumnMapping, DataLoadError};
use std::io::Read;
use std::path::{Path, PathBuf};

/// CSV-based churn source.
///
/// Reads a CSV export of the churn spreadsheet. The first row must hold the
/// column headers; headers are normalized before being matched against the
/// `ColumnMapping`, and columns it does not name are ignored.
#[derive(Debug, Clone)]
pub struct CsvChurnSource {
    path: PathBuf,
    columns: ColumnMapping,
}

impl CsvChurnSource {
    /// Creates a CSV source with the default column mapping.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_columns(path, ColumnMapping::default())
    }

    /// Creates a CSV source with a custom column mapping.
    pub fn with_columns<P: AsRef<Path>>(path: P, columns: ColumnMapping) -> Self {
        CsvChurnSource {
            path: path.as_ref().to_path_buf(),
            columns,
        }
    }

    /// Path of the CSV file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChurnSource for CsvChurnSource {
    fn read_records(&self) -> Result<Vec<ChurnRecord>, DataLoadError> {
        let file = std::fs::File::open(&self.path)?;
        read_csv_records(file, &self.columns)
    }

    fn describe(&self) -> String {
        format!("csv file {}", self.path.display())
    }
}

/// Column positions of the required fields within one CSV file.
struct ColumnIndices {
    age: usize,
    region: usize,
    churn_reason: usize,
    churn_month: usize,
}

impl ColumnIndices {
    fn resolve(headers: &csv::StringRecord, columns: &ColumnMapping) -> Result<Self, DataLoadError> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|header| normalize_column_name(header.trim_start_matches('\u{feff}')))
            .collect();

        let find = |name: &str| {
            normalized
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| DataLoadError::MissingColumn(name.to_string()))
        };

        Ok(ColumnIndices {
            age: find(&columns.age)?,
            region: find(&columns.region)?,
            churn_reason: find(&columns.churn_reason)?,
            churn_month: find(&columns.churn_month)?,
        })
    }
}

/// Parses churn records from any CSV reader.
///
/// Row numbers in errors count data rows from 1, excluding the header.
pub fn read_csv_records<R: Read>(
    reader: R,
    columns: &ColumnMapping,
) -> Result<Vec<ChurnRecord>, DataLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let indices = ColumnIndices::resolve(&headers, columns)?;

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        let row_number = idx + 1;

        let age_raw = row.get(indices.age).unwrap_or("");
        let age = parse_age(age_raw, row_number, &columns.age)?;
        let region = required_cell(&row, indices.region, row_number, &columns.region)?;
        let churn_reason =
            required_cell(&row, indices.churn_reason, row_number, &columns.churn_reason)?;
        let churn_month =
            required_cell(&row, indices.churn_month, row_number, &columns.churn_month)?;

        records.push(ChurnRecord::new(age, region, churn_reason, churn_month));
    }

    Ok(records)
}

fn required_cell<'a>(
    row: &'a csv::StringRecord,
    position: usize,
    row_number: usize,
    column: &str,
) -> Result<&'a str, DataLoadError> {
    match row.get(position) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(DataLoadError::MissingValue {
            row: row_number,
            column: column.to_string(),
        }),
    }
}
