//! Churn dashboard engine: an immutable churn dataset, a pure
//! filter-and-aggregate function over it, and a JSON API serving both.

pub mod churn_record;
pub mod data_source;
pub mod csv_source;
pub mod dataset;
pub mod filter;
pub mod aggregation;
pub mod server;


pub use churn_record::{CategoricalField, ChurnRecord};
pub use data_source::{ChurnSource, ColumnMapping, DataLoadError, InMemoryChurnSource};
pub use csv_source::CsvChurnSource;
pub use dataset::{AgeBounds, Dataset, DatasetSummary, FilterOptions};
pub use filter::{AgeRange, CategoryFilter, FilterSelection, InvalidFilterError};
pub use aggregation::{
    aggregate,
    AggregationKind,
    Aggregations,
    Bin,
    BucketRange,
    Distribution,
    Orientation,
    AGE_BUCKETS,
};
pub use server::{run_server, ServerConfig, AppState, ApiError};
