//! Dataset Store
//!
//! Holds the normalized churn records for the lifetime of the process. A
//! `Dataset` is built once from a `ChurnSource` and never mutated afterwards;
//! it is shared read-only (typically behind an `Arc`) with every aggregation.

use crate::churn_record::{CategoricalField, ChurnRecord};
use crate::data_source::{check_age, ChurnSource, DataLoadError};
use crate::filter::{AgeRange, CategoryFilter, FilterSelection};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Step between age slider marks.
pub const AGE_MARK_STEP: i64 = 5;

/// Inclusive age bounds of a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeBounds {
    pub min: i64,
    pub max: i64,
}

/// Immutable, in-memory churn dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<ChurnRecord>,
    bounds: AgeBounds,
    loaded_at: DateTime<Utc>,
}

impl Dataset {
    /// Loads the dataset from a churn source.
    ///
    /// # Errors
    /// Propagates the source's `DataLoadError`, and returns
    /// `DataLoadError::EmptyDataset` if the source yields no records.
    pub fn load<S: ChurnSource + ?Sized>(source: &S) -> Result<Self, DataLoadError> {
        log::info!("Loading churn dataset from {}", source.describe());

        let records = source.read_records().map_err(|err| {
            log::warn!("Failed to load churn dataset from {}: {}", source.describe(), err);
            err
        })?;
        let dataset = Self::from_records(records)?;

        log::info!(
            "Loaded {} churn records (ages {}..={})",
            dataset.len(),
            dataset.bounds.min,
            dataset.bounds.max
        );
        Ok(dataset)
    }

    /// Builds a dataset directly from records.
    ///
    /// # Errors
    /// Returns `DataLoadError::EmptyDataset` if `records` is empty, and
    /// `DataLoadError::InvalidValue` for an age outside `AGE_LIMITS`.
    pub fn from_records(records: Vec<ChurnRecord>) -> Result<Self, DataLoadError> {
        for (idx, record) in records.iter().enumerate() {
            check_age(record, idx + 1)?;
        }
        let bounds = age_bounds(&records).ok_or(DataLoadError::EmptyDataset)?;
        Ok(Dataset {
            records,
            bounds,
            loaded_at: Utc::now(),
        })
    }

    /// All records, in source order.
    pub fn records(&self) -> &[ChurnRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a successfully loaded dataset.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Minimum and maximum age across the whole dataset.
    pub fn bounds(&self) -> AgeBounds {
        self.bounds
    }

    /// Distinct values of a categorical field, in the order used for control
    /// option lists: regions and reasons sorted ascending, months in order of
    /// first appearance.
    pub fn distinct(&self, field: CategoricalField) -> Vec<String> {
        if field.sorts_options() {
            self.records
                .iter()
                .map(|record| record.field(field).to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        } else {
            self.first_occurrence(field)
        }
    }

    /// Distinct values of a categorical field in order of first appearance.
    pub fn first_occurrence(&self, field: CategoricalField) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|record| record.field(field))
            .filter(|value| seen.insert(*value))
            .map(str::to_string)
            .collect()
    }

    /// The selection that matches every record: full age bounds and every
    /// categorical value selected.
    pub fn default_selection(&self) -> FilterSelection {
        let subset = |field| CategoryFilter::from_values(self.first_occurrence(field));
        FilterSelection {
            age_range: AgeRange::new(self.bounds.min, self.bounds.max),
            regions: subset(CategoricalField::Region),
            churn_reasons: subset(CategoricalField::ChurnReason),
            churn_months: subset(CategoricalField::ChurnMonth),
        }
    }

    /// Summary of the loaded dataset.
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            records: self.len(),
            age_bounds: self.bounds,
            regions: self.first_occurrence(CategoricalField::Region).len(),
            churn_reasons: self.first_occurrence(CategoricalField::ChurnReason).len(),
            churn_months: self.first_occurrence(CategoricalField::ChurnMonth).len(),
            loaded_at: self.loaded_at,
        }
    }
}

/// Minimum and maximum age over a set of records, `None` when empty.
pub(crate) fn age_bounds<'a, I>(records: I) -> Option<AgeBounds>
where
    I: IntoIterator<Item = &'a ChurnRecord>,
{
    records.into_iter().fold(None, |bounds, record| {
        Some(match bounds {
            None => AgeBounds {
                min: record.age,
                max: record.age,
            },
            Some(AgeBounds { min, max }) => AgeBounds {
                min: min.min(record.age),
                max: max.max(record.age),
            },
        })
    })
}

/// Record counts and bounds of a loaded dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub records: usize,
    pub age_bounds: AgeBounds,
    pub regions: usize,
    pub churn_reasons: usize,
    pub churn_months: usize,
    pub loaded_at: DateTime<Utc>,
}

/// One labelled choice of a multi-select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

/// State of one multi-select control at startup.
#[derive(Debug, Clone, Serialize)]
pub struct SelectControl {
    pub options: Vec<SelectOption>,
    pub selected: Vec<String>,
}

impl SelectControl {
    fn for_field(dataset: &Dataset, field: CategoricalField) -> Self {
        SelectControl {
            options: dataset
                .distinct(field)
                .into_iter()
                .map(|value| SelectOption {
                    label: value.clone(),
                    value,
                })
                .collect(),
            selected: dataset.first_occurrence(field),
        }
    }
}

/// State of the age range control at startup.
#[derive(Debug, Clone, Serialize)]
pub struct AgeRangeControl {
    pub min: i64,
    pub max: i64,
    pub step: i64,
    /// Labelled tick marks every `AGE_MARK_STEP` years from `min`
    pub marks: Vec<i64>,
    pub selected: [i64; 2],
}

/// Initial options and selections for every filter control.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub age: AgeRangeControl,
    pub regions: SelectControl,
    pub churn_reasons: SelectControl,
    pub churn_months: SelectControl,
}

impl FilterOptions {
    /// Derives the control state from the dataset.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let AgeBounds { min, max } = dataset.bounds();
        let marks = (min..=max).step_by(AGE_MARK_STEP as usize).collect();

        FilterOptions {
            age: AgeRangeControl {
                min,
                max,
                step: 1,
                marks,
                selected: [min, max],
            },
            regions: SelectControl::for_field(dataset, CategoricalField::Region),
            churn_reasons: SelectControl::for_field(dataset, CategoricalField::ChurnReason),
            churn_months: SelectControl::for_field(dataset, CategoricalField::ChurnMonth),
        }
    }
}
