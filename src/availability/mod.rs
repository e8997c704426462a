mod timeline;

pub use timeline::{overlapping, UnitTimeline};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::interval::{BookingInterval, BookingState, Span};

pub type SharedTimeline = Arc<RwLock<UnitTimeline>>;

/// Committed booking intervals of every fleet unit.
///
/// Each unit's timeline has its own lock, so reservations on different
/// units run in parallel. A mutation holds exactly one unit lock.
/// `snapshot` read-locks every requested unit in ascending id order and
/// holds them together while copying.
///
/// `interval_to_unit` keeps every interval id ever reserved or loaded,
/// matching the retention of cancelled intervals in [`UnitTimeline`].
pub struct AvailabilityIndex {
    units: DashMap<Uuid, SharedTimeline>,
    interval_to_unit: DashMap<Uuid, Uuid>,
    version: AtomicU64,
    active: AtomicUsize,
}

/// Active intervals of a set of units, read at one logical instant.
#[derive(Debug, Clone, Default)]
pub struct AvailabilitySnapshot {
    pub version: u64,
    intervals: HashMap<Uuid, Vec<BookingInterval>>,
}

impl AvailabilitySnapshot {
    pub fn is_free(&self, unit_id: Uuid, span: &Span) -> bool {
        self.intervals
            .get(&unit_id)
            .is_none_or(|sorted| overlapping(sorted, span).is_empty())
    }
}

impl Default for AvailabilityIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_span(span: &Span) -> Result<(), AppError> {
    if !span.is_valid() {
        return Err(AppError::InvalidFilter(format!(
            "interval end {} must be after start {}",
            span.end, span.start
        )));
    }
    Ok(())
}

impl AvailabilityIndex {
    pub fn new() -> Self {
        Self {
            units: DashMap::new(),
            interval_to_unit: DashMap::new(),
            version: AtomicU64::new(0),
            active: AtomicUsize::new(0),
        }
    }

    /// Builds the index from committed rows. Overlapping active rows on one
    /// unit mean the store is corrupt and are rejected.
    pub fn from_intervals(rows: Vec<BookingInterval>) -> Result<Self, AppError> {
        let mut timelines: HashMap<Uuid, UnitTimeline> = HashMap::new();
        let index = Self::new();

        for row in rows {
            if !row.span.is_valid() {
                return Err(AppError::Internal(format!(
                    "interval {} has end before start",
                    row.id
                )));
            }
            if index.interval_to_unit.insert(row.id, row.unit_id).is_some() {
                return Err(AppError::Internal(format!("duplicate interval id {}", row.id)));
            }

            let timeline = timelines.entry(row.unit_id).or_default();
            if row.state.is_active() {
                if let Some(existing) = timeline.overlapping(&row.span).first() {
                    return Err(AppError::Internal(format!(
                        "intervals {} and {} overlap on unit {}",
                        existing.id, row.id, row.unit_id
                    )));
                }
                timeline.insert_active(row);
                index.active.fetch_add(1, Ordering::AcqRel);
            } else {
                timeline.insert_cancelled(row);
            }
        }

        for (unit_id, timeline) in timelines {
            index.units.insert(unit_id, Arc::new(RwLock::new(timeline)));
        }
        Ok(index)
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub(crate) fn timeline(&self, unit_id: Uuid) -> Option<SharedTimeline> {
        self.units.get(&unit_id).map(|entry| entry.value().clone())
    }

    fn timeline_or_insert(&self, unit_id: Uuid) -> SharedTimeline {
        self.units.entry(unit_id).or_default().value().clone()
    }

    fn timeline_for_interval(&self, interval_id: Uuid) -> Result<SharedTimeline, AppError> {
        self.interval_to_unit
            .get(&interval_id)
            .map(|entry| *entry.value())
            .and_then(|unit_id| self.timeline(unit_id))
            .ok_or_else(|| AppError::NotFound(format!("interval {interval_id} not found")))
    }

    pub async fn conflicting_intervals(
        &self,
        unit_id: Uuid,
        span: &Span,
    ) -> Result<Vec<BookingInterval>, AppError> {
        validate_span(span)?;
        let Some(timeline) = self.timeline(unit_id) else {
            return Ok(Vec::new());
        };
        let guard = timeline.read().await;
        Ok(guard.overlapping(span).to_vec())
    }

    pub async fn is_free(&self, unit_id: Uuid, span: &Span) -> Result<bool, AppError> {
        validate_span(span)?;
        let Some(timeline) = self.timeline(unit_id) else {
            return Ok(true);
        };
        let guard = timeline.read().await;
        Ok(guard.overlapping(span).is_empty())
    }

    pub async fn get_interval(&self, interval_id: Uuid) -> Result<BookingInterval, AppError> {
        let timeline = self.timeline_for_interval(interval_id)?;
        let guard = timeline.read().await;
        guard
            .find(interval_id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("interval {interval_id} lost from timeline")))
    }

    /// Check-and-insert under the unit's write lock; a concurrent caller
    /// for an overlapping window sees this interval and gets `Conflict`.
    pub async fn reserve_interval(
        &self,
        unit_id: Uuid,
        span: Span,
    ) -> Result<BookingInterval, AppError> {
        validate_span(&span)?;
        let timeline = self.timeline_or_insert(unit_id);
        let mut guard = timeline.write().await;

        if let Some(existing) = guard.overlapping(&span).first() {
            return Err(AppError::Conflict(format!(
                "unit {unit_id} is already booked by interval {} from {} to {}",
                existing.id, existing.span.start, existing.span.end
            )));
        }

        let interval = BookingInterval {
            id: Uuid::new_v4(),
            unit_id,
            span,
            state: BookingState::Requested,
        };
        guard.insert_active(interval.clone());
        self.interval_to_unit.insert(interval.id, unit_id);
        self.active.fetch_add(1, Ordering::AcqRel);
        self.version.fetch_add(1, Ordering::AcqRel);

        debug!(interval_id = %interval.id, unit_id = %unit_id, "interval reserved");
        Ok(interval)
    }

    /// Cancels the interval. Releasing an already cancelled interval
    /// returns it unchanged.
    pub async fn release_interval(&self, interval_id: Uuid) -> Result<BookingInterval, AppError> {
        let timeline = self.timeline_for_interval(interval_id)?;
        let mut guard = timeline.write().await;

        if let Some(released) = guard.cancel(interval_id) {
            self.active.fetch_sub(1, Ordering::AcqRel);
            self.version.fetch_add(1, Ordering::AcqRel);
            debug!(interval_id = %interval_id, "interval released");
            return Ok(released);
        }

        guard
            .find(interval_id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("interval {interval_id} lost from timeline")))
    }

    /// requested → confirmed. Confirming twice is a no-op; a cancelled
    /// interval can no longer be confirmed.
    pub async fn confirm_interval(&self, interval_id: Uuid) -> Result<BookingInterval, AppError> {
        let timeline = self.timeline_for_interval(interval_id)?;
        let mut guard = timeline.write().await;

        match guard.find(interval_id).map(|i| i.state) {
            Some(BookingState::Confirmed) => guard
                .find(interval_id)
                .cloned()
                .ok_or_else(|| AppError::Internal(format!("interval {interval_id} vanished"))),
            Some(BookingState::Requested) => {
                let confirmed = guard
                    .confirm(interval_id)
                    .ok_or_else(|| AppError::Internal(format!("interval {interval_id} vanished")))?;
                self.version.fetch_add(1, Ordering::AcqRel);
                debug!(interval_id = %interval_id, "interval confirmed");
                Ok(confirmed)
            }
            Some(BookingState::Cancelled) => Err(AppError::Conflict(format!(
                "interval {interval_id} is cancelled"
            ))),
            None => Err(AppError::Internal(format!(
                "interval {interval_id} lost from timeline"
            ))),
        }
    }

    /// Reads the active intervals overlapping `window` for `unit_ids` at one
    /// instant: all their read locks are held at once while copying.
    pub async fn snapshot(&self, unit_ids: &[Uuid], window: &Span) -> AvailabilitySnapshot {
        let mut ids = unit_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        // Ascending id order. Mutations never hold more than one unit lock.
        let mut guards = Vec::with_capacity(ids.len());
        for unit_id in ids {
            let timeline = self.timeline_or_insert(unit_id);
            guards.push((unit_id, timeline.read_owned().await));
        }
        let version = self.version();

        let intervals = guards
            .iter()
            .filter_map(|(unit_id, guard)| {
                let hits = guard.overlapping(window);
                (!hits.is_empty()).then(|| (*unit_id, hits.to_vec()))
            })
            .collect();

        AvailabilitySnapshot { version, intervals }
    }

    /// Requested plus confirmed intervals across all units.
    pub fn active_interval_count(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Checks the no-overlap invariant on every unit.
    pub async fn is_consistent(&self) -> bool {
        let timelines: Vec<SharedTimeline> =
            self.units.iter().map(|entry| entry.value().clone()).collect();

        for timeline in timelines {
            if !timeline.read().await.is_consistent() {
                return false;
            }
        }
        true
    }
}
