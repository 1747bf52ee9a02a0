//! HTTP request handlers for API endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use super::state::AppState;
use crate::aggregation::{aggregate, Aggregations};
use crate::dataset::{DatasetSummary, FilterOptions};
use crate::filter::{AgeRange, CategoryFilter, FilterSelection};

/// Response for the health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub dataset: DatasetSummary,
}

/// GET /health - Health check with dataset summary
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        dataset: state.dataset.summary(),
    })
}

/// GET /filters - Options and initial selections for every filter control
pub async fn get_filter_options(State(state): State<Arc<AppState>>) -> Json<FilterOptions> {
    Json(state.filter_options.as_ref().clone())
}

/// Request body for an aggregation query
///
/// A missing or empty value list places no restriction on that field.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregationRequest {
    pub age_range: [i64; 2],
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub churn_reasons: Vec<String>,
    #[serde(default)]
    pub churn_months: Vec<String>,
}

impl From<AggregationRequest> for FilterSelection {
    fn from(request: AggregationRequest) -> Self {
        let [min, max] = request.age_range;
        FilterSelection {
            age_range: AgeRange::new(min, max),
            regions: CategoryFilter::from_values(request.regions),
            churn_reasons: CategoryFilter::from_values(request.churn_reasons),
            churn_months: CategoryFilter::from_values(request.churn_months),
        }
    }
}

/// GET /aggregations - Distributions for the default (unfiltered) selection
pub async fn get_default_aggregations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Aggregations>, ApiError> {
    let selection = state.dataset.default_selection();
    let result = aggregate(&state.dataset, &selection)?;
    Ok(Json(result))
}

/// POST /aggregations - Filter the dataset and compute the four distributions
pub async fn post_aggregations(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AggregationRequest>, JsonRejection>,
) -> Result<Json<Aggregations>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!("Rejected aggregation request body: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;
    let selection = FilterSelection::from(request);

    let result = aggregate(&state.dataset, &selection).map_err(|err| {
        tracing::warn!("Rejected filter selection: {}", err);
        ApiError::from(err)
    })?;

    tracing::debug!(
        "Aggregated {} of {} records (ages {}..={})",
        result.matched,
        state.dataset.len(),
        selection.age_range.min,
        selection.age_range.max
    );

    Ok(Json(result))
}
