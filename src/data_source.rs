use crate::churn_record::ChurnRecord;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Trait for churn data source abstraction.
///
/// The dataset store only needs a finished list of records; where they come
/// from is up to the implementation:
/// - In-memory vector (for testing)
/// - CSV export of the churn spreadsheet
pub trait ChurnSource {
    /// Reads every churn record from the source.
    ///
    /// # Errors
    /// Returns an error if the source is missing or unreadable, if a required
    /// column is absent, or if a required value is missing or malformed.
    fn read_records(&self) -> Result<Vec<ChurnRecord>, DataLoadError>;

    /// Human-readable name of the source, used in log lines.
    fn describe(&self) -> String;
}

/// Errors that can occur while loading the churn dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLoadError {
    /// The source does not exist
    SourceNotFound(String),
    /// The source exists but could not be read or parsed
    Unreadable(String),
    /// A required column is absent (normalized column name)
    MissingColumn(String),
    /// A required value is empty
    MissingValue { row: usize, column: String },
    /// A value could not be interpreted
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    /// No records were found
    EmptyDataset,
}

impl std::fmt::Display for DataLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataLoadError::SourceNotFound(source) => write!(f, "Data source not found: {}", source),
            DataLoadError::Unreadable(msg) => write!(f, "Data source unreadable: {}", msg),
            DataLoadError::MissingColumn(column) => write!(f, "Required column missing: {}", column),
            DataLoadError::MissingValue { row, column } => {
                write!(f, "Missing value in column '{}' at row {}", column, row)
            }
            DataLoadError::InvalidValue { row, column, value } => write!(
                f,
                "Invalid value '{}' in column '{}' at row {}",
                value, column, row
            ),
            DataLoadError::EmptyDataset => write!(f, "Dataset contains no records"),
        }
    }
}

impl std::error::Error for DataLoadError {}

impl From<std::io::Error> for DataLoadError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => DataLoadError::SourceNotFound(err.to_string()),
            _ => DataLoadError::Unreadable(err.to_string()),
        }
    }
}

impl From<csv::Error> for DataLoadError {
    fn from(err: csv::Error) -> Self {
        if let csv::ErrorKind::Io(io_err) = err.kind() {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                return DataLoadError::SourceNotFound(err.to_string());
            }
        }
        DataLoadError::Unreadable(err.to_string())
    }
}

/// Normalized column names holding each required field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub age: String,
    pub region: String,
    pub churn_reason: String,
    pub churn_month: String,
}

impl Default for ColumnMapping {
    /// Column names of the churn spreadsheet export, after normalization.
    fn default() -> Self {
        ColumnMapping {
            age: "idade".to_string(),
            region: "região".to_string(),
            churn_reason: "motivo_do_churn".to_string(),
            churn_month: "mês_do_churn".to_string(),
        }
    }
}

impl ColumnMapping {
    /// Creates a mapping; every name is normalized the same way headers are.
    pub fn new(
        age: &str,
        region: &str,
        churn_reason: &str,
        churn_month: &str,
    ) -> Self {
        ColumnMapping {
            age: normalize_column_name(age),
            region: normalize_column_name(region),
            churn_reason: normalize_column_name(churn_reason),
            churn_month: normalize_column_name(churn_month),
        }
    }
}

/// Normalizes a header: surrounding whitespace stripped, inner spaces
/// replaced by underscores, lowercased.
///
/// ```
/// use churn_dashboard::data_source::normalize_column_name;
///
/// assert_eq!(normalize_column_name(" Motivo do Churn "), "motivo_do_churn");
/// assert_eq!(normalize_column_name("Mês do Churn"), "mês_do_churn");
/// ```
pub fn normalize_column_name(name: &str) -> String {
    name.trim().replace(' ', "_").to_lowercase()
}

/// Youngest and oldest age accepted from a data source.
pub const AGE_LIMITS: RangeInclusive<i64> = 0..=150;

/// Parses an age cell. Spreadsheet exports often write integers as `34.0`;
/// those are accepted, anything with a fractional part is not. Ages outside
/// `AGE_LIMITS` are rejected.
pub(crate) fn parse_age(raw: &str, row: usize, column: &str) -> Result<i64, DataLoadError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DataLoadError::MissingValue {
            row,
            column: column.to_string(),
        });
    }

    let invalid = || DataLoadError::InvalidValue {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    };

    let age = match trimmed.parse::<i64>() {
        Ok(age) => age,
        Err(_) => {
            let value = trimmed.parse::<f64>().map_err(|_| invalid())?;
            if !value.is_finite() || value.fract() != 0.0 {
                return Err(invalid());
            }
            // Saturating cast; anything this large fails the limit check below
            value as i64
        }
    };

    if !AGE_LIMITS.contains(&age) {
        return Err(invalid());
    }
    Ok(age)
}

/// Checks that an already-built record has an age within `AGE_LIMITS`.
pub(crate) fn check_age(record: &ChurnRecord, row: usize) -> Result<(), DataLoadError> {
    if AGE_LIMITS.contains(&record.age) {
        Ok(())
    } else {
        Err(DataLoadError::InvalidValue {
            row,
            column: "age".to_string(),
            value: record.age.to_string(),
        })
    }
}

/// In-memory churn source for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChurnSource {
    records: Vec<ChurnRecord>,
}

impl InMemoryChurnSource {
    /// Creates a source over the given records.
    pub fn new(records: Vec<ChurnRecord>) -> Self {
        InMemoryChurnSource { records }
    }
}

impl ChurnSource for InMemoryChurnSource {
    fn read_records(&self) -> Result<Vec<ChurnRecord>, DataLoadError> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory ({} records)", self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("Idade"), "idade");
        assert_eq!(normalize_column_name("  Região "), "região");
        assert_eq!(normalize_column_name("Motivo do Churn"), "motivo_do_churn");
    }

    #[test]
    fn test_column_mapping_new_normalizes() {
        let mapping = ColumnMapping::new("Age", "Region", "Churn Reason", " Churn Month ");
        assert_eq!(mapping.age, "age");
        assert_eq!(mapping.churn_reason, "churn_reason");
        assert_eq!(mapping.churn_month, "churn_month");
    }

    #[test]
    fn test_parse_age_accepts_integral_floats() {
        assert_eq!(parse_age("34", 1, "idade").unwrap(), 34);
        assert_eq!(parse_age(" 34.0 ", 1, "idade").unwrap(), 34);
    }

    #[test]
    fn test_parse_age_rejects_fraction_and_text() {
        assert!(matches!(
            parse_age("34.5", 3, "idade"),
            Err(DataLoadError::InvalidValue { row: 3, .. })
        ));
        assert!(matches!(
            parse_age("abc", 4, "idade"),
            Err(DataLoadError::InvalidValue { row: 4, .. })
        ));
    }

    #[test]
    fn test_parse_age_rejects_out_of_range() {
        for raw in ["1e18", "-5", "151", "9223372036854775807", "-9223372036854775808"] {
            assert!(
                matches!(parse_age(raw, 7, "idade"), Err(DataLoadError::InvalidValue { row: 7, .. })),
                "{} should be rejected",
                raw
            );
        }
        assert_eq!(parse_age("0", 1, "idade").unwrap(), 0);
        assert_eq!(parse_age("150", 1, "idade").unwrap(), 150);
    }

    #[test]
    fn test_check_age() {
        assert!(check_age(&ChurnRecord::new(40, "N", "Preço", "Jan"), 1).is_ok());
        assert_eq!(
            check_age(&ChurnRecord::new(-1, "N", "Preço", "Jan"), 3),
            Err(DataLoadError::InvalidValue {
                row: 3,
                column: "age".to_string(),
                value: "-1".to_string()
            })
        );
    }

    #[test]
    fn test_parse_age_empty_is_missing() {
        assert_eq!(
            parse_age("  ", 2, "idade"),
            Err(DataLoadError::MissingValue {
                row: 2,
                column: "idade".to_string()
            })
        );
    }

    #[test]
    fn test_in_memory_source_returns_records() {
        let source = InMemoryChurnSource::new(vec![ChurnRecord::new(20, "N", "Preço", "Jan")]);
        let records = source.read_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(source.describe(), "in-memory (1 records)");
    }

    #[test]
    fn test_io_not_found_maps_to_source_not_found() {
        let err: DataLoadError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, DataLoadError::SourceNotFound(_)));
    }
}
