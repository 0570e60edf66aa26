//! Green coffee bag models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::REPROCESSED_BEAN_TYPE;

/// Where a bag currently is in its lifecycle.
///
/// Bags only move forward: `InMain -> InRoastery -> Used`. Reprocessed
/// bags are created directly `InRoastery`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BagStatus {
    InMain,
    InRoastery,
    Used,
}

impl BagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BagStatus::InMain => "in_main",
            BagStatus::InRoastery => "in_roastery",
            BagStatus::Used => "used",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in_main" => Some(BagStatus::InMain),
            "in_roastery" => Some(BagStatus::InRoastery),
            "used" => Some(BagStatus::Used),
            _ => None,
        }
    }

    /// Whether a bag in this status may move to `next`
    pub fn can_transition_to(&self, next: BagStatus) -> bool {
        matches!(
            (self, next),
            (BagStatus::InMain, BagStatus::InRoastery)
                | (BagStatus::InRoastery, BagStatus::InRoastery)
                | (BagStatus::InRoastery, BagStatus::Used)
        )
    }
}

/// A physical bag of green coffee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bag {
    pub id: Uuid,
    pub bag_code: String,
    pub bean_type: String,
    pub weight_kg: Decimal,
    pub initial_weight_kg: Decimal,
    pub status: BagStatus,
    pub warehouse_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Bag {
    /// Whether this bag holds blended-back material from a roast
    pub fn is_reprocessed(&self) -> bool {
        self.bean_type == REPROCESSED_BEAN_TYPE
    }
}

/// A bag to be inserted; the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBag {
    pub bag_code: String,
    pub bean_type: String,
    pub weight_kg: Decimal,
    pub status: BagStatus,
    pub warehouse_id: Option<Uuid>,
    pub notes: Option<String>,
}
