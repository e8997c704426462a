use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use uuid::Uuid;

use crate::engine::refresh::{refresh_catalog, CatalogSummary};
use crate::error::AppError;
use crate::models::unit::FleetUnit;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/units/:id", get(get_unit))
        .route("/api/catalog/refresh", post(refresh))
}

async fn get_unit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FleetUnit>, AppError> {
    let catalog = state.catalog.load();
    Ok(Json(catalog.lookup_unit(id)?.clone()))
}

async fn refresh(State(state): State<Arc<AppState>>) -> Result<Json<CatalogSummary>, AppError> {
    Ok(Json(refresh_catalog(&state)?))
}
