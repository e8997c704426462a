use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::booking;
use crate::error::AppError;
use crate::models::interval::{BookingInterval, Span};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/intervals", post(reserve_interval))
        .route("/api/intervals/:id", get(get_interval))
        .route("/api/intervals/:id/confirm", post(confirm_interval))
        .route("/api/intervals/:id/release", post(release_interval))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveIntervalRequest {
    pub unit_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

async fn reserve_interval(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReserveIntervalRequest>,
) -> Result<(StatusCode, Json<BookingInterval>), AppError> {
    let span = Span::new(payload.start, payload.end);
    let interval = booking::reserve(&state, payload.unit_id, span).await?;
    Ok((StatusCode::CREATED, Json(interval)))
}

async fn get_interval(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingInterval>, AppError> {
    Ok(Json(state.availability.get_interval(id).await?))
}

async fn confirm_interval(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingInterval>, AppError> {
    Ok(Json(booking::confirm(&state, id).await?))
}

async fn release_interval(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingInterval>, AppError> {
    Ok(Json(booking::release(&state, id).await?))
}
