//! Filter-and-Aggregate Engine
//!
//! A stateless function from a dataset and a filter selection to the four
//! chart distributions. Every call filters the records afresh and builds new
//! result values; nothing is cached or shared between calls, so concurrent
//! invocations over the same `Dataset` are safe without locking.

use crate::churn_record::{CategoricalField, ChurnRecord};
use crate::dataset::{age_bounds, AgeBounds, Dataset};
use crate::filter::{FilterSelection, InvalidFilterError};
use serde::Serialize;
use std::collections::HashMap;

/// Number of equal-width buckets in the age histogram.
pub const AGE_BUCKETS: usize = 20;

/// The four distributions derived from a filtered subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    Reason,
    Region,
    Age,
    Month,
}

impl AggregationKind {
    pub const ALL: [AggregationKind; 4] = [
        AggregationKind::Reason,
        AggregationKind::Region,
        AggregationKind::Age,
        AggregationKind::Month,
    ];

    /// Display title of the chart.
    pub fn title(self) -> &'static str {
        match self {
            AggregationKind::Reason => "Churn reasons",
            AggregationKind::Region => "Distribution by region",
            AggregationKind::Age => "Age distribution",
            AggregationKind::Month => "Churn by month",
        }
    }

    /// Bar colour of the chart.
    pub fn color(self) -> &'static str {
        match self {
            AggregationKind::Reason => "indianred",
            AggregationKind::Region => "teal",
            AggregationKind::Age => "orange",
            AggregationKind::Month => "steelblue",
        }
    }

    /// Reason labels are long, so that chart is drawn with horizontal bars.
    pub fn orientation(self) -> Orientation {
        match self {
            AggregationKind::Reason => Orientation::Horizontal,
            _ => Orientation::Vertical,
        }
    }

    fn field(self) -> Option<CategoricalField> {
        match self {
            AggregationKind::Reason => Some(CategoricalField::ChurnReason),
            AggregationKind::Region => Some(CategoricalField::Region),
            AggregationKind::Month => Some(CategoricalField::ChurnMonth),
            AggregationKind::Age => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Edges of one age bucket. `upper` is exclusive except on the last bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketRange {
    pub lower: f64,
    pub upper: f64,
}

/// One bar of a distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub label: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<BucketRange>,
}

/// A frequency count of records grouped by one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub kind: AggregationKind,
    pub title: &'static str,
    pub color: &'static str,
    pub orientation: Orientation,
    pub bins: Vec<Bin>,
}

impl Distribution {
    fn new(kind: AggregationKind, bins: Vec<Bin>) -> Self {
        Distribution {
            kind,
            title: kind.title(),
            color: kind.color(),
            orientation: kind.orientation(),
            bins,
        }
    }

    /// Sum of all bin counts.
    pub fn total(&self) -> usize {
        self.bins.iter().map(|bin| bin.count).sum()
    }

    /// Count for a label, `None` if the label has no bin.
    pub fn count(&self, label: &str) -> Option<usize> {
        self.bins
            .iter()
            .find(|bin| bin.label == label)
            .map(|bin| bin.count)
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Result of one aggregation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregations {
    /// Number of records that passed every filter
    pub matched: usize,
    pub reasons: Distribution,
    pub regions: Distribution,
    pub ages: Distribution,
    pub months: Distribution,
}

impl Aggregations {
    pub fn get(&self, kind: AggregationKind) -> &Distribution {
        match kind {
            AggregationKind::Reason => &self.reasons,
            AggregationKind::Region => &self.regions,
            AggregationKind::Age => &self.ages,
            AggregationKind::Month => &self.months,
        }
    }

    /// Distributions in chart order.
    pub fn iter(&self) -> impl Iterator<Item = &Distribution> {
        AggregationKind::ALL.into_iter().map(move |kind| self.get(kind))
    }
}

/// Filters the dataset by `selection` and computes the four distributions.
///
/// # Errors
/// Returns `InvalidFilterError` if the selection is malformed; no partial
/// result is produced. An empty filtered subset is not an error: every
/// distribution is then empty.
///
/// # Examples
/// ```
/// use churn_dashboard::{aggregate, AgeRange, ChurnRecord, Dataset, FilterSelection};
///
/// let dataset = Dataset::from_records(vec![
///     ChurnRecord::new(20, "N", "Price", "Jan"),
///     ChurnRecord::new(25, "N", "Price", "Jan"),
///     ChurnRecord::new(30, "S", "Service", "Feb"),
///     ChurnRecord::new(35, "S", "Price", "Feb"),
///     ChurnRecord::new(40, "S", "Service", "Mar"),
/// ])
/// .unwrap();
///
/// let selection = FilterSelection::new(AgeRange::new(25, 35)).with_regions(["S"]);
/// let result = aggregate(&dataset, &selection).unwrap();
///
/// assert_eq!(result.matched, 2);
/// assert_eq!(result.regions.count("S"), Some(2));
/// ```
pub fn aggregate(
    dataset: &Dataset,
    selection: &FilterSelection,
) -> Result<Aggregations, InvalidFilterError> {
    selection.validate()?;

    let filtered: Vec<&ChurnRecord> = dataset
        .records()
        .iter()
        .filter(|record| selection.matches(record))
        .collect();

    let categorical = |kind: AggregationKind| {
        let bins = match kind.field() {
            Some(field) => count_by_field(&filtered, field),
            None => Vec::new(),
        };
        Distribution::new(kind, bins)
    };

    Ok(Aggregations {
        matched: filtered.len(),
        reasons: categorical(AggregationKind::Reason),
        regions: categorical(AggregationKind::Region),
        ages: Distribution::new(AggregationKind::Age, age_histogram(&filtered)),
        months: categorical(AggregationKind::Month),
    })
}

/// Counts records per distinct value, bins in order of first appearance.
fn count_by_field(records: &[&ChurnRecord], field: CategoricalField) -> Vec<Bin> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut bins: Vec<Bin> = Vec::new();

    for record in records {
        let value = record.field(field);
        match positions.get(value) {
            Some(&idx) => bins[idx].count += 1,
            None => {
                positions.insert(value, bins.len());
                bins.push(Bin {
                    label: value.to_string(),
                    count: 1,
                    range: None,
                });
            }
        }
    }

    bins
}

/// Bins ages into `AGE_BUCKETS` equal-width buckets spanning the ages of
/// `records`.
///
/// A subset whose ages are all equal is binned over `[age - 0.5, age + 0.5]`.
fn age_histogram(records: &[&ChurnRecord]) -> Vec<Bin> {
    let Some(AgeBounds { min, max }) = age_bounds(records.iter().copied()) else {
        return Vec::new();
    };

    let span = max as i128 - min as i128;
    let (lower, width) = if span == 0 {
        (min as f64 - 0.5, 1.0 / AGE_BUCKETS as f64)
    } else {
        (min as f64, span as f64 / AGE_BUCKETS as f64)
    };

    let mut counts = vec![0usize; AGE_BUCKETS];
    for record in records {
        counts[bucket_index(record.age, min, span)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| {
            let range = BucketRange {
                lower: lower + idx as f64 * width,
                upper: lower + (idx + 1) as f64 * width,
            };
            Bin {
                label: bucket_label(&range, idx + 1 == AGE_BUCKETS),
                count,
                range: Some(range),
            }
        })
        .collect()
}

/// Index of the bucket holding `age`, computed in integer arithmetic so
/// ages on a bucket edge always land in the upper bucket.
fn bucket_index(age: i64, min: i64, span: i128) -> usize {
    if span == 0 {
        return AGE_BUCKETS / 2;
    }
    let offset = (age as i128 - min as i128) * AGE_BUCKETS as i128 / span;
    (offset as usize).min(AGE_BUCKETS - 1)
}

fn bucket_label(range: &BucketRange, last: bool) -> String {
    let close = if last { ']' } else { ')' };
    format!(
        "[{}, {}{}",
        format_edge(range.lower),
        format_edge(range.upper),
        close
    )
}

/// Formats a bucket edge with at most two decimals.
fn format_edge(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{}", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::AgeRange;

    fn five_records() -> Dataset {
        Dataset::from_records(vec![
            ChurnRecord::new(20, "N", "Preço", "Jan"),
            ChurnRecord::new(25, "N", "Atendimento", "Jan"),
            ChurnRecord::new(30, "S", "Preço", "Fev"),
            ChurnRecord::new(35, "S", "Mudança", "Fev"),
            ChurnRecord::new(40, "S", "Preço", "Mar"),
        ])
        .unwrap()
    }

    #[test]
    fn test_region_example() {
        let dataset = five_records();
        let selection = FilterSelection::new(AgeRange::new(25, 35)).with_regions(["S"]);
        let result = aggregate(&dataset, &selection).unwrap();

        assert_eq!(result.matched, 2);
        assert_eq!(result.regions.bins.len(), 1);
        assert_eq!(result.regions.count("S"), Some(2));
        assert_eq!(result.regions.count("N"), None);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let dataset = five_records();
        let selection = FilterSelection::new(AgeRange::new(40, 20));
        assert_eq!(
            aggregate(&dataset, &selection),
            Err(InvalidFilterError::InvertedAgeRange { min: 40, max: 20 })
        );
    }

    #[test]
    fn test_empty_subset_gives_empty_distributions() {
        let dataset = five_records();
        let selection = FilterSelection::new(AgeRange::new(50, 60));
        let result = aggregate(&dataset, &selection).unwrap();

        assert_eq!(result.matched, 0);
        for distribution in result.iter() {
            assert!(distribution.is_empty());
            assert_eq!(distribution.total(), 0);
        }
    }

    #[test]
    fn test_categorical_bins_in_first_appearance_order() {
        let dataset = five_records();
        let result = aggregate(&dataset, &FilterSelection::new(AgeRange::new(20, 40))).unwrap();

        let labels: Vec<&str> = result.reasons.bins.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Preço", "Atendimento", "Mudança"]);
        assert_eq!(result.reasons.count("Preço"), Some(3));

        let months: Vec<&str> = result.months.bins.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(months, vec!["Jan", "Fev", "Mar"]);
    }

    #[test]
    fn test_age_histogram_spans_filtered_range() {
        let dataset = five_records();
        let result = aggregate(&dataset, &FilterSelection::new(AgeRange::new(20, 40))).unwrap();
        let bins = &result.ages.bins;

        assert_eq!(bins.len(), AGE_BUCKETS);
        assert_eq!(bins[0].range, Some(BucketRange { lower: 20.0, upper: 21.0 }));
        assert_eq!(bins[AGE_BUCKETS - 1].label, "[39, 40]");
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[5].count, 1);
        assert_eq!(bins[10].count, 1);
        assert_eq!(bins[15].count, 1);
        assert_eq!(bins[19].count, 1);

        // Narrowing the age range moves the bucket edges with it.
        let narrow = aggregate(&dataset, &FilterSelection::new(AgeRange::new(30, 40))).unwrap();
        assert_eq!(
            narrow.ages.bins[0].range,
            Some(BucketRange { lower: 30.0, upper: 30.5 })
        );
        assert_eq!(narrow.ages.bins[0].label, "[30, 30.5)");
        assert_eq!(narrow.ages.bins[10].count, 1);
    }

    #[test]
    fn test_age_histogram_single_age() {
        let dataset = five_records();
        let result = aggregate(&dataset, &FilterSelection::new(AgeRange::new(30, 30))).unwrap();
        let bins = &result.ages.bins;

        assert_eq!(bins.len(), AGE_BUCKETS);
        assert_eq!(result.ages.total(), 1);
        let occupied = bins.iter().find(|bin| bin.count == 1).unwrap();
        let range = occupied.range.unwrap();
        assert!(range.lower <= 30.0 && 30.0 < range.upper);
    }

    #[test]
    fn test_bucket_index_edges() {
        assert_eq!(bucket_index(20, 20, 20), 0);
        assert_eq!(bucket_index(21, 20, 20), 1);
        assert_eq!(bucket_index(40, 20, 20), AGE_BUCKETS - 1);
        // width 0.3: age 23 sits exactly on the edge of bucket 10
        assert_eq!(bucket_index(23, 20, 6), 10);
    }

    #[test]
    fn test_age_histogram_extreme_span() {
        let low = ChurnRecord::new(i64::MIN, "N", "Preço", "Jan");
        let high = ChurnRecord::new(i64::MAX, "S", "Preço", "Jan");
        let bins = age_histogram(&[&low, &high]);

        assert_eq!(bins.len(), AGE_BUCKETS);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[AGE_BUCKETS - 1].count, 1);
        assert_eq!(bucket_index(0, i64::MIN, i64::MAX as i128 - i64::MIN as i128), 10);
    }

    #[test]
    fn test_distribution_metadata() {
        let dataset = five_records();
        let result = aggregate(&dataset, &dataset.default_selection()).unwrap();
        assert_eq!(result.reasons.orientation, Orientation::Horizontal);
        assert_eq!(result.ages.color, "orange");
        assert_eq!(result.months.title, "Churn by month");
    }
}
