use std::cmp::Ordering;

use uuid::Uuid;

use crate::availability::AvailabilitySnapshot;
use crate::catalog::{CategoryFilter, FleetCatalog};
use crate::engine::pricing::quote;
use crate::error::AppError;
use crate::models::category::Category;
use crate::models::search::{MatchConfidence, Offer, SearchCriteria};
use crate::models::unit::FleetUnit;

#[derive(Debug, Clone, Copy)]
pub struct SearchPolicy {
    pub substitutes_enabled: bool,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            substitutes_enabled: true,
        }
    }
}

/// Units eligible for a search before availability is considered.
#[derive(Debug, Default)]
pub struct Candidates<'a> {
    pub exact: Vec<&'a FleetUnit>,
    pub substitutes: Vec<&'a FleetUnit>,
}

impl Candidates<'_> {
    pub fn unit_ids(&self) -> Vec<Uuid> {
        self.exact
            .iter()
            .chain(self.substitutes.iter())
            .map(|unit| unit.id)
            .collect()
    }
}

pub fn validate_criteria(criteria: &SearchCriteria) -> Result<(), AppError> {
    if !criteria.window.is_valid() {
        return Err(AppError::InvalidFilter(format!(
            "return time {} must be after pickup time {}",
            criteria.window.end, criteria.window.start
        )));
    }
    if criteria.min_seats == Some(0) {
        return Err(AppError::InvalidFilter("seats must be > 0".to_string()));
    }
    Ok(())
}

fn is_eligible(unit: &FleetUnit, criteria: &SearchCriteria) -> bool {
    let caps = &unit.capabilities;

    unit.is_active()
        && criteria
            .location
            .as_deref()
            .is_none_or(|location| unit.location.eq_ignore_ascii_case(location.trim()))
        && (!criteria.driver_required || caps.driver_included)
        && criteria.min_seats.is_none_or(|seats| caps.seats >= seats)
        && criteria
            .transmission
            .is_none_or(|transmission| caps.transmission == transmission)
}

fn eligible_units<'a>(
    catalog: &'a FleetCatalog,
    categories: &[&Category],
    criteria: &SearchCriteria,
) -> Result<Vec<&'a FleetUnit>, AppError> {
    let mut units = Vec::new();
    for category in categories {
        for unit in catalog.list_units_by_category(category.id)? {
            if is_eligible(unit, criteria) {
                units.push(unit);
            }
        }
    }
    Ok(units)
}

/// Resolves the category filter and collects exact and substitute units.
/// A filter that names no category yields no candidates rather than an error.
pub fn candidates<'a>(
    catalog: &'a FleetCatalog,
    criteria: &SearchCriteria,
    policy: SearchPolicy,
) -> Result<Candidates<'a>, AppError> {
    validate_criteria(criteria)?;

    let exact_categories = match criteria.category.as_deref() {
        Some(raw) => {
            let filter = CategoryFilter::parse(raw)?;
            match catalog.resolve_category(&filter) {
                Ok(categories) => categories,
                Err(AppError::NotFound(_)) => return Ok(Candidates::default()),
                Err(err) => return Err(err),
            }
        }
        None => catalog.all_categories(),
    };

    let exact = eligible_units(catalog, &exact_categories, criteria)?;

    let substitutes = if policy.substitutes_enabled
        && criteria.allow_substitutes
        && criteria.category.is_some()
    {
        let ids: Vec<Uuid> = exact_categories.iter().map(|c| c.id).collect();
        let siblings = catalog.substitute_categories(&ids);
        eligible_units(catalog, &siblings, criteria)?
    } else {
        Vec::new()
    };

    Ok(Candidates { exact, substitutes })
}

struct Ranked {
    offer: Offer,
    partner_priority: u32,
}

fn compare(a: &Ranked, b: &Ranked) -> Ordering {
    a.offer
        .confidence
        .cmp(&b.offer.confidence)
        .then_with(|| a.offer.price.cmp(&b.offer.price))
        .then_with(|| a.partner_priority.cmp(&b.partner_priority))
        .then_with(|| a.offer.unit_id.cmp(&b.offer.unit_id))
}

fn build_offers(
    catalog: &FleetCatalog,
    units: &[&FleetUnit],
    snapshot: &AvailabilitySnapshot,
    criteria: &SearchCriteria,
    confidence: MatchConfidence,
) -> Result<Vec<Ranked>, AppError> {
    units
        .iter()
        .filter(|unit| snapshot.is_free(unit.id, &criteria.window))
        .map(|unit| {
            let (price, billable_days) = quote(unit, &criteria.window)?;
            Ok(Ranked {
                offer: Offer {
                    unit_id: unit.id,
                    unit_name: unit.name.clone(),
                    category_id: unit.category_id,
                    partner_id: unit.partner_id,
                    price,
                    billable_days,
                    confidence,
                    rank_score: 0.0,
                },
                partner_priority: catalog.partner_priority(unit.partner_id),
            })
        })
        .collect()
}

/// Free, priced offers for `criteria`, best first.
///
/// Ordering is exact before substitute, then price, then partner priority,
/// then unit id. Substitutes are only offered when no exact unit is free.
pub fn find_offers(
    catalog: &FleetCatalog,
    snapshot: &AvailabilitySnapshot,
    criteria: &SearchCriteria,
    policy: SearchPolicy,
) -> Result<Vec<Offer>, AppError> {
    let candidates = candidates(catalog, criteria, policy)?;

    let mut ranked = build_offers(
        catalog,
        &candidates.exact,
        snapshot,
        criteria,
        MatchConfidence::Exact,
    )?;
    if ranked.is_empty() {
        ranked = build_offers(
            catalog,
            &candidates.substitutes,
            snapshot,
            criteria,
            MatchConfidence::Substitute,
        )?;
    }

    ranked.sort_by(compare);

    let total = ranked.len();
    Ok(ranked
        .into_iter()
        .enumerate()
        .map(|(position, ranked)| {
            let mut offer = ranked.offer;
            offer.rank_score = (total - position) as f64 / total as f64;
            offer
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    use super::{find_offers, SearchPolicy};
    use crate::availability::AvailabilityIndex;
    use crate::catalog::{CatalogData, FleetCatalog};
    use crate::error::AppError;
    use crate::models::category::{Category, Partner};
    use crate::models::interval::Span;
    use crate::models::search::{MatchConfidence, SearchCriteria};
    use crate::models::unit::{Capabilities, FleetUnit, Transmission, UnitStatus};

    const CARS: u128 = 1;
    const SUV: u128 = 2;
    const COMPACT: u128 = 3;
    const VANS: u128 = 4;
    const UNIT_A: u128 = 10;
    const UNIT_B: u128 = 11;
    const UNIT_C: u128 = 12;
    const UNIT_V: u128 = 13;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn category(seed: u128, name: &str, parent: Option<u128>) -> Category {
        Category {
            id: Uuid::from_u128(seed),
            name: name.to_string(),
            rank: 0,
            parent_id: parent.map(Uuid::from_u128),
        }
    }

    fn unit(seed: u128, category: u128, partner: u128, rate: u64, seats: u8) -> FleetUnit {
        FleetUnit {
            id: Uuid::from_u128(seed),
            name: format!("unit-{seed}"),
            category_id: Uuid::from_u128(category),
            partner_id: Uuid::from_u128(partner),
            location: "BER".to_string(),
            daily_rate: rate,
            capabilities: Capabilities {
                seats,
                transmission: Transmission::Automatic,
                driver_included: seed == UNIT_A,
            },
            status: UnitStatus::Active,
        }
    }

    /// A: SUV, 100/day, partner priority 1. B: SUV, 90/day, priority 2.
    /// C: Compact (sibling of SUV), 50/day. V: Vans (no siblings).
    fn catalog() -> FleetCatalog {
        FleetCatalog::new(CatalogData {
            categories: vec![
                category(CARS, "Cars", None),
                category(SUV, "SUV", Some(CARS)),
                category(COMPACT, "Compact", Some(CARS)),
                category(VANS, "Vans", None),
            ],
            partners: vec![
                Partner {
                    id: Uuid::from_u128(100),
                    name: "first".to_string(),
                    priority: 1,
                },
                Partner {
                    id: Uuid::from_u128(200),
                    name: "second".to_string(),
                    priority: 2,
                },
            ],
            units: vec![
                unit(UNIT_A, SUV, 100, 100, 5),
                unit(UNIT_B, SUV, 200, 90, 5),
                unit(UNIT_C, COMPACT, 100, 50, 5),
                unit(UNIT_V, VANS, 200, 120, 9),
            ],
        })
        .unwrap()
    }

    fn criteria(category: Option<&str>) -> SearchCriteria {
        SearchCriteria {
            window: Span::new(day(1), day(3)),
            location: Some("ber".to_string()),
            category: category.map(str::to_string),
            driver_required: false,
            min_seats: None,
            transmission: None,
            allow_substitutes: true,
        }
    }

    fn ids(offers: &[crate::models::search::Offer]) -> Vec<u128> {
        offers.iter().map(|o| o.unit_id.as_u128()).collect()
    }

    #[tokio::test]
    async fn cheaper_unit_ranks_before_higher_priority_partner() {
        let catalog = catalog();
        let index = AvailabilityIndex::new();
        let criteria = criteria(Some("SUV"));
        let snapshot = index.snapshot(&[], &criteria.window).await;

        let offers = find_offers(&catalog, &snapshot, &criteria, SearchPolicy::default()).unwrap();

        assert_eq!(ids(&offers), vec![UNIT_B, UNIT_A]);
        assert_eq!(offers[0].price, 180);
        assert_eq!(offers[0].billable_days, 2);
        assert!(offers[0].rank_score > offers[1].rank_score);
        assert!(offers.iter().all(|o| o.confidence == MatchConfidence::Exact));
    }

    #[tokio::test]
    async fn booked_unit_is_excluded() {
        let catalog = catalog();
        let index = AvailabilityIndex::new();
        let criteria = criteria(Some("SUV"));
        index
            .reserve_interval(Uuid::from_u128(UNIT_A), Span::new(day(2), day(4)))
            .await
            .unwrap();

        let snapshot = index
            .snapshot(&[Uuid::from_u128(UNIT_A), Uuid::from_u128(UNIT_B)], &criteria.window)
            .await;
        let offers = find_offers(&catalog, &snapshot, &criteria, SearchPolicy::default()).unwrap();

        assert_eq!(ids(&offers), vec![UNIT_B]);
    }

    #[tokio::test]
    async fn substitutes_fill_in_when_no_exact_unit_is_free() {
        let catalog = catalog();
        let index = AvailabilityIndex::new();
        let criteria = criteria(Some("SUV"));
        for unit in [UNIT_A, UNIT_B] {
            index
                .reserve_interval(Uuid::from_u128(unit), Span::new(day(1), day(2)))
                .await
                .unwrap();
        }
        let all = [UNIT_A, UNIT_B, UNIT_C].map(Uuid::from_u128);
        let snapshot = index.snapshot(&all, &criteria.window).await;

        let offers = find_offers(&catalog, &snapshot, &criteria, SearchPolicy::default()).unwrap();
        assert_eq!(ids(&offers), vec![UNIT_C]);
        assert_eq!(offers[0].confidence, MatchConfidence::Substitute);

        let disabled = SearchPolicy {
            substitutes_enabled: false,
        };
        assert!(find_offers(&catalog, &snapshot, &criteria, disabled)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn capability_filters_apply_to_substitutes_too() {
        let catalog = catalog();
        let index = AvailabilityIndex::new();
        let mut criteria = criteria(Some("SUV"));
        criteria.driver_required = true;

        let snapshot = index.snapshot(&[], &criteria.window).await;
        let offers = find_offers(&catalog, &snapshot, &criteria, SearchPolicy::default()).unwrap();
        assert_eq!(ids(&offers), vec![UNIT_A]);

        criteria.driver_required = false;
        criteria.min_seats = Some(7);
        let offers = find_offers(&catalog, &snapshot, &criteria, SearchPolicy::default()).unwrap();
        assert!(offers.is_empty());
    }

    #[tokio::test]
    async fn unknown_category_yields_empty_result() {
        let catalog = catalog();
        let index = AvailabilityIndex::new();
        let criteria = criteria(Some("Boats"));
        let snapshot = index.snapshot(&[], &criteria.window).await;

        let offers = find_offers(&catalog, &snapshot, &criteria, SearchPolicy::default()).unwrap();
        assert!(offers.is_empty());
    }

    #[tokio::test]
    async fn malformed_criteria_are_rejected() {
        let catalog = catalog();
        let snapshot = AvailabilityIndex::new()
            .snapshot(&[], &Span::new(day(1), day(2)))
            .await;

        let mut inverted = criteria(None);
        inverted.window = Span::new(day(3), day(1));
        assert!(matches!(
            find_offers(&catalog, &snapshot, &inverted, SearchPolicy::default()),
            Err(AppError::InvalidFilter(_))
        ));

        let bad_filter = criteria(Some("SUV/x"));
        assert!(matches!(
            find_offers(&catalog, &snapshot, &bad_filter, SearchPolicy::default()),
            Err(AppError::InvalidFilter(_))
        ));
    }

    #[tokio::test]
    async fn ranking_is_deterministic() {
        let catalog = catalog();
        let index = AvailabilityIndex::new();
        let criteria = criteria(None);
        let snapshot = index.snapshot(&[], &criteria.window).await;

        let first = find_offers(&catalog, &snapshot, &criteria, SearchPolicy::default()).unwrap();
        let second = find_offers(&catalog, &snapshot, &criteria, SearchPolicy::default()).unwrap();

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(ids(&first), vec![UNIT_C, UNIT_B, UNIT_A, UNIT_V]);
    }
}
