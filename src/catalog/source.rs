use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::category::{Category, Partner};
use crate::models::interval::BookingInterval;
use crate::models::unit::FleetUnit;

/// Raw catalog records as handed over by the backing store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub partners: Vec<Partner>,
    #[serde(default)]
    pub units: Vec<FleetUnit>,
}

/// The backing store for fleet records and committed booking rows.
pub trait CatalogSource: Send + Sync {
    fn load_catalog(&self) -> Result<CatalogData, AppError>;

    /// Committed interval rows, read once at startup.
    fn load_intervals(&self) -> Result<Vec<BookingInterval>, AppError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(flatten)]
    catalog: CatalogData,
    #[serde(default)]
    intervals: Vec<BookingInterval>,
}

/// Reads a JSON seed file on every load, so edits are picked up by refresh.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<SeedFile, AppError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|err| {
            AppError::Internal(format!("failed to read {}: {err}", self.path.display()))
        })?;

        serde_json::from_str(&raw).map_err(|err| {
            AppError::Internal(format!("failed to parse {}: {err}", self.path.display()))
        })
    }
}

impl CatalogSource for JsonFileSource {
    fn load_catalog(&self) -> Result<CatalogData, AppError> {
        Ok(self.read()?.catalog)
    }

    fn load_intervals(&self) -> Result<Vec<BookingInterval>, AppError> {
        Ok(self.read()?.intervals)
    }
}

/// In-memory source; `replace` stands in for an admin edit upstream.
#[derive(Debug, Default)]
pub struct StaticSource {
    catalog: Mutex<CatalogData>,
    intervals: Vec<BookingInterval>,
}

impl StaticSource {
    pub fn new(catalog: CatalogData) -> Self {
        Self::with_intervals(catalog, Vec::new())
    }

    pub fn with_intervals(catalog: CatalogData, intervals: Vec<BookingInterval>) -> Self {
        Self {
            catalog: Mutex::new(catalog),
            intervals,
        }
    }

    pub fn replace(&self, catalog: CatalogData) {
        *self.catalog.lock() = catalog;
    }
}

impl CatalogSource for StaticSource {
    fn load_catalog(&self) -> Result<CatalogData, AppError> {
        Ok(self.catalog.lock().clone())
    }

    fn load_intervals(&self) -> Result<Vec<BookingInterval>, AppError> {
        Ok(self.intervals.clone())
    }
}
