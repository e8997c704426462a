use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error};

use crate::engine::resolver::{candidates, find_offers};
use crate::error::AppError;
use crate::models::search::{SearchCriteria, SearchResult};
use crate::state::AppState;

/// Single entry point for the search boundary.
///
/// Reads one catalog version and one availability snapshot, so every offer
/// in the result reflects the same state. Internal failures are logged
/// here and replaced by a generic error.
pub async fn query(state: &AppState, criteria: SearchCriteria) -> Result<SearchResult, AppError> {
    let start = Instant::now();
    let deadline = state.query_timeout;

    let outcome = match tokio::time::timeout(deadline, run_query(state, &criteria)).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(deadline.as_millis() as u64)),
    };

    let label = match &outcome {
        Ok(_) => "success",
        Err(AppError::InvalidFilter(_)) => "invalid",
        Err(AppError::Timeout(_)) => "timeout",
        Err(_) => "error",
    };
    state
        .metrics
        .search_latency_seconds
        .with_label_values(&[label])
        .observe(start.elapsed().as_secs_f64());
    state.metrics.searches_total.with_label_values(&[label]).inc();

    outcome.map_err(|err| match err {
        AppError::Internal(detail) => {
            error!(error = %detail, "search failed");
            AppError::Internal("failed to resolve search".to_string())
        }
        other => other,
    })
}

async fn run_query(state: &AppState, criteria: &SearchCriteria) -> Result<SearchResult, AppError> {
    let catalog = state.catalog.load();
    let unit_ids = candidates(&catalog, criteria, state.search_policy)?.unit_ids();

    let snapshot = state.availability.snapshot(&unit_ids, &criteria.window).await;
    let offers = find_offers(&catalog, &snapshot, criteria, state.search_policy)?;

    debug!(
        candidates = unit_ids.len(),
        offers = offers.len(),
        availability_version = snapshot.version,
        "search resolved"
    );

    Ok(SearchResult {
        offers,
        generated_at: Utc::now(),
    })
}
