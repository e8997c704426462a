use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Manual,
    Automatic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub seats: u8,
    pub transmission: Transmission,
    pub driver_included: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FleetUnit {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
    pub partner_id: Uuid,
    pub location: String,
    /// Price per started day in minor currency units.
    pub daily_rate: u64,
    pub capabilities: Capabilities,
    pub status: UnitStatus,
}

impl FleetUnit {
    pub fn is_active(&self) -> bool {
        self.status == UnitStatus::Active
    }
}
