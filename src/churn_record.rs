use serde::{Deserialize, Serialize};
use std::fmt;

/// A single churn event: one row of the churn spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChurnRecord {
    /// Customer age at churn
    pub age: i64,
    /// Region label, kept exactly as read
    pub region: String,
    /// Churn reason (whitespace-trimmed)
    pub churn_reason: String,
    /// Churn month label (whitespace-trimmed, not necessarily a calendar month)
    pub churn_month: String,
}

impl ChurnRecord {
    /// Creates a new ChurnRecord.
    ///
    /// Reason and month are trimmed; region is stored untouched.
    pub fn new(
        age: i64,
        region: impl Into<String>,
        churn_reason: impl AsRef<str>,
        churn_month: impl AsRef<str>,
    ) -> Self {
        ChurnRecord {
            age,
            region: region.into(),
            churn_reason: churn_reason.as_ref().trim().to_string(),
            churn_month: churn_month.as_ref().trim().to_string(),
        }
    }

    /// Returns the value of a categorical field.
    pub fn field(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::Region => &self.region,
            CategoricalField::ChurnReason => &self.churn_reason,
            CategoricalField::ChurnMonth => &self.churn_month,
        }
    }
}

/// The categorical columns of a churn record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    Region,
    ChurnReason,
    ChurnMonth,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 3] = [
        CategoricalField::Region,
        CategoricalField::ChurnReason,
        CategoricalField::ChurnMonth,
    ];

    /// Whether control options for this field are listed in sorted order.
    ///
    /// Month labels keep the order in which they first appear in the data.
    pub fn sorts_options(self) -> bool {
        !matches!(self, CategoricalField::ChurnMonth)
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoricalField::Region => write!(f, "region"),
            CategoricalField::ChurnReason => write!(f, "churn_reason"),
            CategoricalField::ChurnMonth => write!(f, "churn_month"),
        }
    }
}
