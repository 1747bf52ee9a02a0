//! Shared application state for the API server

use crate::dataset::{Dataset, FilterOptions};
use std::sync::Arc;

/// Shared application state
///
/// The dataset is immutable once loaded, so handlers read it concurrently
/// without a lock.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Churn dataset, loaded once at startup
    pub dataset: Arc<Dataset>,
    /// Initial control state, derived from the dataset at startup
    pub filter_options: Arc<FilterOptions>,
}

impl AppState {
    /// Creates a new application state
    pub fn new(dataset: Dataset) -> Self {
        let filter_options = FilterOptions::from_dataset(&dataset);
        AppState {
            dataset: Arc::new(dataset),
            filter_options: Arc::new(filter_options),
        }
    }
}
