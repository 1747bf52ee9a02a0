use crate::churn_record::{CategoricalField, ChurnRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive age interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    /// Minimum age (inclusive)
    pub min: i64,
    /// Maximum age (inclusive)
    pub max: i64,
}

impl AgeRange {
    /// Creates a new AgeRange. The range is not validated here; see
    /// `FilterSelection::validate`.
    pub fn new(min: i64, max: i64) -> Self {
        AgeRange { min, max }
    }

    pub fn contains(&self, age: i64) -> bool {
        self.min <= age && age <= self.max
    }
}

/// Restriction on one categorical field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// No restriction
    #[default]
    All,
    /// Only these values. An empty set matches every value, exactly like `All`.
    Subset(BTreeSet<String>),
}

impl CategoryFilter {
    /// Builds a filter from the values picked in a multi-select control.
    ///
    /// A control with nothing picked yields `All`.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if set.is_empty() {
            CategoryFilter::All
        } else {
            CategoryFilter::Subset(set)
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Subset(values) => values.is_empty() || values.contains(value),
        }
    }
}

/// The current combination of control values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub age_range: AgeRange,
    pub regions: CategoryFilter,
    pub churn_reasons: CategoryFilter,
    pub churn_months: CategoryFilter,
}

impl FilterSelection {
    /// Selection over an age range with no categorical restriction.
    pub fn new(age_range: AgeRange) -> Self {
        FilterSelection {
            age_range,
            regions: CategoryFilter::All,
            churn_reasons: CategoryFilter::All,
            churn_months: CategoryFilter::All,
        }
    }

    pub fn with_regions<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = CategoryFilter::from_values(values);
        self
    }

    pub fn with_churn_reasons<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.churn_reasons = CategoryFilter::from_values(values);
        self
    }

    pub fn with_churn_months<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.churn_months = CategoryFilter::from_values(values);
        self
    }

    /// The filter applied to a categorical field.
    pub fn category(&self, field: CategoricalField) -> &CategoryFilter {
        match field {
            CategoricalField::Region => &self.regions,
            CategoricalField::ChurnReason => &self.churn_reasons,
            CategoricalField::ChurnMonth => &self.churn_months,
        }
    }

    /// Checks that the selection is well formed.
    ///
    /// # Errors
    /// Returns `InvalidFilterError::InvertedAgeRange` if `min > max`.
    pub fn validate(&self) -> Result<(), InvalidFilterError> {
        if self.age_range.min > self.age_range.max {
            return Err(InvalidFilterError::InvertedAgeRange {
                min: self.age_range.min,
                max: self.age_range.max,
            });
        }
        Ok(())
    }

    /// Whether a record passes every filter dimension.
    pub fn matches(&self, record: &ChurnRecord) -> bool {
        self.age_range.contains(record.age)
            && CategoricalField::ALL
                .iter()
                .all(|&field| self.category(field).matches(record.field(field)))
    }
}

/// Errors for malformed filter selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidFilterError {
    /// Minimum age greater than maximum age
    InvertedAgeRange { min: i64, max: i64 },
}

impl std::fmt::Display for InvalidFilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidFilterError::InvertedAgeRange { min, max } => write!(
                f,
                "Invalid age range: minimum {} is greater than maximum {}",
                min, max
            ),
        }
    }
}

impl std::error::Error for InvalidFilterError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_range_inclusive() {
        let range = AgeRange::new(25, 35);
        assert!(range.contains(25));
        assert!(range.contains(35));
        assert!(!range.contains(24));
        assert!(!range.contains(36));
    }

    #[test]
    fn test_empty_values_mean_all() {
        let filter = CategoryFilter::from_values(Vec::<String>::new());
        assert_eq!(filter, CategoryFilter::All);
        assert!(filter.matches("anything"));
    }

    #[test]
    fn test_empty_subset_matches_everything() {
        let filter = CategoryFilter::Subset(BTreeSet::new());
        assert!(filter.matches("Norte"));
        assert!(filter.matches(""));
    }

    #[test]
    fn test_subset_membership() {
        let filter = CategoryFilter::from_values(["Norte", "Sul"]);
        assert!(filter.matches("Sul"));
        assert!(!filter.matches("Nordeste"));
        assert!(!filter.matches("sul"));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let selection = FilterSelection::new(AgeRange::new(40, 20));
        assert_eq!(
            selection.validate(),
            Err(InvalidFilterError::InvertedAgeRange { min: 40, max: 20 })
        );
    }

    #[test]
    fn test_validate_accepts_single_age() {
        let selection = FilterSelection::new(AgeRange::new(30, 30));
        assert!(selection.validate().is_ok());
    }

    #[test]
    fn test_matches_is_conjunctive() {
        let record = ChurnRecord::new(30, "Sul", "Preço", "Janeiro");
        let base = FilterSelection::new(AgeRange::new(18, 60));
        assert!(base.matches(&record));
        assert!(base.clone().with_regions(["Sul"]).matches(&record));
        assert!(!base
            .clone()
            .with_regions(["Sul"])
            .with_churn_months(["Fevereiro"])
            .matches(&record));
        assert!(!FilterSelection::new(AgeRange::new(31, 60)).matches(&record));
    }
}
