use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::interval::{BookingInterval, Span};
use crate::state::AppState;

/// Reserves `span` on an active catalog unit. Not retried on conflict.
pub async fn reserve(
    state: &AppState,
    unit_id: Uuid,
    span: Span,
) -> Result<BookingInterval, AppError> {
    let result = reserve_checked(state, unit_id, span).await;

    let label = match &result {
        Ok(_) => "success",
        Err(AppError::Conflict(_)) => "conflict",
        Err(AppError::NotFound(_) | AppError::InvalidFilter(_)) => "rejected",
        Err(_) => "error",
    };
    state
        .metrics
        .reservations_total
        .with_label_values(&[label])
        .inc();

    match &result {
        Ok(interval) => {
            state
                .metrics
                .active_intervals
                .set(state.availability.active_interval_count() as i64);
            info!(
                interval_id = %interval.id,
                unit_id = %unit_id,
                start = %span.start,
                end = %span.end,
                "interval reserved"
            );
        }
        Err(err) => warn!(unit_id = %unit_id, error = %err, "reservation rejected"),
    }

    result
}

async fn reserve_checked(
    state: &AppState,
    unit_id: Uuid,
    span: Span,
) -> Result<BookingInterval, AppError> {
    let catalog = state.catalog.load();
    let unit = catalog.lookup_unit(unit_id)?;
    if !unit.is_active() {
        return Err(AppError::InvalidFilter(format!("unit {unit_id} is inactive")));
    }

    state.availability.reserve_interval(unit_id, span).await
}

pub async fn confirm(state: &AppState, interval_id: Uuid) -> Result<BookingInterval, AppError> {
    let interval = state.availability.confirm_interval(interval_id).await?;
    info!(interval_id = %interval_id, "interval confirmed");
    Ok(interval)
}

/// Cancels the interval; repeated calls return the cancelled interval.
pub async fn release(state: &AppState, interval_id: Uuid) -> Result<BookingInterval, AppError> {
    let interval = state.availability.release_interval(interval_id).await?;
    state
        .metrics
        .active_intervals
        .set(state.availability.active_interval_count() as i64);
    info!(interval_id = %interval_id, "interval released");
    Ok(interval)
}
