pub mod filter;
pub mod source;
pub mod store;

pub use filter::{CategoryFilter, is_addressable_name};
pub use source::{CatalogData, CatalogSource, JsonFileSource, StaticSource};
pub use store::CatalogStore;

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::AppError;
use crate::models::category::{Category, Partner};
use crate::models::unit::FleetUnit;

/// Immutable, validated view over fleet records. Replaced wholesale on refresh.
#[derive(Debug, Default)]
pub struct FleetCatalog {
    categories: HashMap<Uuid, Category>,
    partners: HashMap<Uuid, Partner>,
    units: HashMap<Uuid, FleetUnit>,
    children: HashMap<Uuid, Vec<Uuid>>,
    /// Category id → unit ids, ordered by partner priority then unit id.
    by_category: HashMap<Uuid, Vec<Uuid>>,
    /// Lowercased category name → category id.
    by_name: HashMap<String, Uuid>,
}

impl FleetCatalog {
    pub fn new(data: CatalogData) -> Result<Self, AppError> {
        let mut catalog = FleetCatalog::default();

        for category in data.categories {
            if !is_addressable_name(&category.name) {
                return Err(AppError::Internal(format!(
                    "category {} has a name no filter can select: {:?}",
                    category.id, category.name
                )));
            }
            let key = category.name.trim().to_lowercase();
            if catalog.by_name.insert(key, category.id).is_some() {
                return Err(AppError::Internal(format!(
                    "duplicate category name: {}",
                    category.name
                )));
            }
            if catalog.categories.insert(category.id, category).is_some() {
                return Err(AppError::Internal("duplicate category id".to_string()));
            }
        }

        for partner in data.partners {
            let id = partner.id;
            if catalog.partners.insert(id, partner).is_some() {
                return Err(AppError::Internal(format!("duplicate partner id: {id}")));
            }
        }

        for category in catalog.categories.values() {
            if let Some(parent_id) = category.parent_id {
                if !catalog.categories.contains_key(&parent_id) {
                    return Err(AppError::Internal(format!(
                        "category {} references unknown parent {parent_id}",
                        category.id
                    )));
                }
                catalog
                    .children
                    .entry(parent_id)
                    .or_default()
                    .push(category.id);
            }
        }
        catalog.check_acyclic()?;

        for unit in data.units {
            if !catalog.categories.contains_key(&unit.category_id) {
                return Err(AppError::Internal(format!(
                    "unit {} references unknown category {}",
                    unit.id, unit.category_id
                )));
            }
            if !catalog.partners.contains_key(&unit.partner_id) {
                return Err(AppError::Internal(format!(
                    "unit {} references unknown partner {}",
                    unit.id, unit.partner_id
                )));
            }
            catalog
                .by_category
                .entry(unit.category_id)
                .or_default()
                .push(unit.id);
            let id = unit.id;
            if catalog.units.insert(id, unit).is_some() {
                return Err(AppError::Internal(format!("duplicate unit id: {id}")));
            }
        }

        let units = &catalog.units;
        let partners = &catalog.partners;
        for ids in catalog.by_category.values_mut() {
            ids.sort_by_key(|id| {
                let priority = units
                    .get(id)
                    .and_then(|unit| partners.get(&unit.partner_id))
                    .map_or(u32::MAX, |partner| partner.priority);
                (priority, *id)
            });
        }

        for children in catalog.children.values_mut() {
            children.sort();
        }

        Ok(catalog)
    }

    fn check_acyclic(&self) -> Result<(), AppError> {
        for category in self.categories.values() {
            let mut seen = HashSet::new();
            let mut current = Some(category.id);
            while let Some(id) = current {
                if !seen.insert(id) {
                    return Err(AppError::Internal(format!(
                        "category parent cycle detected at {id}"
                    )));
                }
                current = self.categories.get(&id).and_then(|c| c.parent_id);
            }
        }
        Ok(())
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn lookup_unit(&self, id: Uuid) -> Result<&FleetUnit, AppError> {
        self.units
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("unit {id} not found")))
    }

    pub fn partner_priority(&self, partner_id: Uuid) -> u32 {
        self.partners
            .get(&partner_id)
            .map_or(u32::MAX, |partner| partner.priority)
    }

    /// Units of one category, ordered by partner priority then unit id.
    pub fn list_units_by_category(&self, category_id: Uuid) -> Result<Vec<&FleetUnit>, AppError> {
        if !self.categories.contains_key(&category_id) {
            return Err(AppError::NotFound(format!(
                "category {category_id} not found"
            )));
        }

        Ok(self
            .by_category
            .get(&category_id)
            .map(|ids| ids.iter().filter_map(|id| self.units.get(id)).collect())
            .unwrap_or_default())
    }

    /// Categories matched by `filter`, ordered by rank, name and id.
    pub fn resolve_category(&self, filter: &CategoryFilter) -> Result<Vec<&Category>, AppError> {
        let mut resolved = match filter {
            CategoryFilter::Id(_) | CategoryFilter::Name(_) => vec![self.resolve_single(filter)?],
            CategoryFilter::Subtree(root) => {
                let root = self.resolve_single(root)?;
                let mut subtree = vec![root];
                let mut pending = vec![root.id];
                while let Some(id) = pending.pop() {
                    for child_id in self.children.get(&id).into_iter().flatten() {
                        if let Some(child) = self.categories.get(child_id) {
                            subtree.push(child);
                            pending.push(child.id);
                        }
                    }
                }
                subtree
            }
        };

        sort_categories(&mut resolved);
        Ok(resolved)
    }

    fn resolve_single(&self, filter: &CategoryFilter) -> Result<&Category, AppError> {
        let found = match filter {
            CategoryFilter::Id(id) => self.categories.get(id),
            CategoryFilter::Name(name) => self
                .by_name
                .get(&name.to_lowercase())
                .and_then(|id| self.categories.get(id)),
            CategoryFilter::Subtree(_) => {
                return Err(AppError::InvalidFilter(
                    "nested subtree filters are not supported".to_string(),
                ));
            }
        };

        found.ok_or_else(|| AppError::NotFound(format!("no category matches {filter}")))
    }

    pub fn all_categories(&self) -> Vec<&Category> {
        let mut all: Vec<&Category> = self.categories.values().collect();
        sort_categories(&mut all);
        all
    }

    /// Siblings of the given categories (same parent), excluding the given ones.
    pub fn substitute_categories(&self, category_ids: &[Uuid]) -> Vec<&Category> {
        let given: HashSet<Uuid> = category_ids.iter().copied().collect();
        let parents: HashSet<Uuid> = category_ids
            .iter()
            .filter_map(|id| self.categories.get(id))
            .filter_map(|category| category.parent_id)
            .collect();

        let mut siblings: Vec<&Category> = parents
            .iter()
            .filter_map(|parent| self.children.get(parent))
            .flatten()
            .filter(|id| !given.contains(id))
            .filter_map(|id| self.categories.get(id))
            .collect();

        sort_categories(&mut siblings);
        siblings.dedup_by_key(|category| category.id);
        siblings
    }
}

fn sort_categories(categories: &mut [&Category]) {
    categories.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
}
