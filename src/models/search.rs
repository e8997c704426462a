use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::interval::Span;
use crate::models::unit::Transmission;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub window: Span,
    pub location: Option<String>,
    pub category: Option<String>,
    pub driver_required: bool,
    pub min_seats: Option<u8>,
    pub transmission: Option<Transmission>,
    pub allow_substitutes: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MatchConfidence {
    Exact,
    Substitute,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub unit_id: Uuid,
    pub unit_name: String,
    pub category_id: Uuid,
    pub partner_id: Uuid,
    pub price: u64,
    pub billable_days: u64,
    pub confidence: MatchConfidence,
    pub rank_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub offers: Vec<Offer>,
    pub generated_at: DateTime<Utc>,
}
