use std::sync::Arc;
use std::time::Duration;

use crate::availability::AvailabilityIndex;
use crate::catalog::{CatalogSource, CatalogStore};
use crate::engine::resolver::SearchPolicy;
use crate::error::AppError;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub catalog: CatalogStore,
    pub availability: AvailabilityIndex,
    pub search_policy: SearchPolicy,
    pub query_timeout: Duration,
    pub metrics: Metrics,
}

impl AppState {
    /// Loads the catalog and committed intervals from `source`.
    pub fn new(
        source: Arc<dyn CatalogSource>,
        search_policy: SearchPolicy,
        query_timeout: Duration,
    ) -> Result<Self, AppError> {
        let catalog = CatalogStore::open(source.clone())?;
        let availability = AvailabilityIndex::from_intervals(source.load_intervals()?)?;

        let metrics = Metrics::new();
        metrics.catalog_units.set(catalog.load().unit_count() as i64);
        metrics
            .active_intervals
            .set(availability.active_interval_count() as i64);

        Ok(Self {
            catalog,
            availability,
            search_policy,
            query_timeout,
            metrics,
        })
    }
}
