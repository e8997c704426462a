use crate::error::AppError;
use crate::models::interval::Span;
use crate::models::unit::FleetUnit;

const DAY_MS: i64 = 86_400_000;

/// Whole days charged for `window`: every started day counts, at least one.
pub fn billable_days(window: &Span) -> u64 {
    let millis = (window.end - window.start).num_milliseconds().max(0);
    let days = (millis + DAY_MS - 1) / DAY_MS;
    days.max(1) as u64
}

/// Price of renting `unit` over `window`, with the billed day count.
pub fn quote(unit: &FleetUnit, window: &Span) -> Result<(u64, u64), AppError> {
    let days = billable_days(window);
    let price = unit.daily_rate.checked_mul(days).ok_or_else(|| {
        AppError::Internal(format!(
            "price overflow for unit {} over {days} days",
            unit.id
        ))
    })?;
    Ok((price, days))
}
