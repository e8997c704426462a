use std::collections::HashMap;

use uuid::Uuid;

use crate::models::interval::{BookingInterval, BookingState, Span};

/// Booking intervals of a single fleet unit.
///
/// `active` holds requested/confirmed intervals sorted by start. They are
/// pairwise disjoint, so their ends are sorted as well and an overlap
/// query is two binary searches.
///
/// Cancelled intervals are kept by id for the lifetime of the process so
/// that lookups and repeated releases still resolve; a restart reloads
/// them from the catalog source.
#[derive(Debug, Default, Clone)]
pub struct UnitTimeline {
    active: Vec<BookingInterval>,
    cancelled: HashMap<Uuid, BookingInterval>,
}

/// Slice of `sorted` (disjoint, ordered by start) overlapping `query`.
pub fn overlapping<'a>(sorted: &'a [BookingInterval], query: &Span) -> &'a [BookingInterval] {
    let right = sorted.partition_point(|i| i.span.start < query.end);
    let left = sorted[..right].partition_point(|i| i.span.end <= query.start);
    &sorted[left..right]
}

impl UnitTimeline {
    pub fn active(&self) -> &[BookingInterval] {
        &self.active
    }

    pub fn overlapping(&self, query: &Span) -> &[BookingInterval] {
        overlapping(&self.active, query)
    }

    /// Inserts without checking; the caller has already ruled out overlap.
    pub fn insert_active(&mut self, interval: BookingInterval) {
        debug_assert!(interval.state.is_active());
        let pos = self
            .active
            .partition_point(|i| i.span.start < interval.span.start);
        self.active.insert(pos, interval);
    }

    pub fn insert_cancelled(&mut self, interval: BookingInterval) {
        self.cancelled.insert(interval.id, interval);
    }

    pub fn find(&self, id: Uuid) -> Option<&BookingInterval> {
        self.cancelled
            .get(&id)
            .or_else(|| self.active.iter().find(|i| i.id == id))
    }

    /// Moves an active interval to the cancelled set.
    pub fn cancel(&mut self, id: Uuid) -> Option<BookingInterval> {
        let pos = self.active.iter().position(|i| i.id == id)?;
        let mut interval = self.active.remove(pos);
        interval.state = BookingState::Cancelled;
        self.cancelled.insert(id, interval.clone());
        Some(interval)
    }

    pub fn confirm(&mut self, id: Uuid) -> Option<BookingInterval> {
        let interval = self.active.iter_mut().find(|i| i.id == id)?;
        interval.state = BookingState::Confirmed;
        Some(interval.clone())
    }

    /// True when no two active intervals overlap and they are ordered.
    pub fn is_consistent(&self) -> bool {
        self.active
            .windows(2)
            .all(|pair| pair[0].span.end <= pair[1].span.start)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    use super::UnitTimeline;
    use crate::models::interval::{BookingInterval, BookingState, Span};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn interval(seed: u128, start: u32, end: u32) -> BookingInterval {
        BookingInterval {
            id: Uuid::from_u128(seed),
            unit_id: Uuid::from_u128(1),
            span: Span::new(at(start), at(end)),
            state: BookingState::Requested,
        }
    }

    fn timeline() -> UnitTimeline {
        let mut timeline = UnitTimeline::default();
        timeline.insert_active(interval(3, 14, 16));
        timeline.insert_active(interval(1, 8, 10));
        timeline.insert_active(interval(2, 10, 12));
        timeline
    }

    #[test]
    fn insert_keeps_start_order() {
        let timeline = timeline();
        let ids: Vec<u128> = timeline.active().iter().map(|i| i.id.as_u128()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(timeline.is_consistent());
    }

    #[test]
    fn overlap_query_respects_half_open_bounds() {
        let timeline = timeline();

        assert!(timeline.overlapping(&Span::new(at(12), at(14))).is_empty());
        assert!(timeline.overlapping(&Span::new(at(0), at(8))).is_empty());

        let hits: Vec<u128> = timeline
            .overlapping(&Span::new(at(9), at(15)))
            .iter()
            .map(|i| i.id.as_u128())
            .collect();
        assert_eq!(hits, vec![1, 2, 3]);

        let hits: Vec<u128> = timeline
            .overlapping(&Span::new(at(11), at(13)))
            .iter()
            .map(|i| i.id.as_u128())
            .collect();
        assert_eq!(hits, vec![2]);
    }

    #[test]
    fn cancel_moves_interval_out_of_active_set() {
        let mut timeline = timeline();
        let cancelled = timeline.cancel(Uuid::from_u128(2)).unwrap();

        assert_eq!(cancelled.state, BookingState::Cancelled);
        assert!(timeline.overlapping(&Span::new(at(10), at(12))).is_empty());
        assert_eq!(
            timeline.find(Uuid::from_u128(2)).unwrap().state,
            BookingState::Cancelled
        );
        assert!(timeline.cancel(Uuid::from_u128(2)).is_none());
    }
}
