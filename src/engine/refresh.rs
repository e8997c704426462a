use std::sync::Arc;

use serde::Serialize;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub units: usize,
    pub categories: usize,
}

/// Reloads the catalog from its source and swaps it in.
pub fn refresh_catalog(state: &AppState) -> Result<CatalogSummary, AppError> {
    match state.catalog.refresh() {
        Ok(catalog) => {
            state
                .metrics
                .catalog_refreshes_total
                .with_label_values(&["success"])
                .inc();
            state.metrics.catalog_units.set(catalog.unit_count() as i64);

            Ok(CatalogSummary {
                units: catalog.unit_count(),
                categories: catalog.category_count(),
            })
        }
        Err(err) => {
            state
                .metrics
                .catalog_refreshes_total
                .with_label_values(&["error"])
                .inc();
            Err(err)
        }
    }
}

pub async fn run_catalog_refresher(state: Arc<AppState>, period: Duration) {
    info!(period_secs = period.as_secs(), "catalog refresher started");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; the catalog was just loaded.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if let Err(err) = refresh_catalog(&state) {
            error!(error = %err, "scheduled catalog refresh failed");
        }
    }
}
