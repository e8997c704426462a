use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::catalog::{CatalogSource, FleetCatalog};
use crate::error::AppError;

/// Process-wide catalog handle. Readers clone the current `Arc` and keep
/// working on it; refresh builds a new catalog and swaps the pointer.
pub struct CatalogStore {
    current: RwLock<Arc<FleetCatalog>>,
    source: Arc<dyn CatalogSource>,
}

impl CatalogStore {
    /// Loads and validates the catalog once; fails if the source is unusable.
    pub fn open(source: Arc<dyn CatalogSource>) -> Result<Self, AppError> {
        let catalog = FleetCatalog::new(source.load_catalog()?)?;
        info!(
            units = catalog.unit_count(),
            categories = catalog.category_count(),
            "catalog loaded"
        );

        Ok(Self {
            current: RwLock::new(Arc::new(catalog)),
            source,
        })
    }

    pub fn load(&self) -> Arc<FleetCatalog> {
        self.current.read().clone()
    }

    /// Reloads from the source. On failure the previous catalog stays live.
    pub fn refresh(&self) -> Result<Arc<FleetCatalog>, AppError> {
        let catalog = self
            .source
            .load_catalog()
            .and_then(FleetCatalog::new)
            .map_err(|err| {
                warn!(error = %err, "catalog refresh rejected");
                err
            })?;

        let catalog = Arc::new(catalog);
        *self.current.write() = catalog.clone();

        info!(
            units = catalog.unit_count(),
            categories = catalog.category_count(),
            "catalog refreshed"
        );
        Ok(catalog)
    }
}
