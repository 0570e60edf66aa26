//! Warehouse models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three kinds of site a bag or a roasted output can live at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseKind {
    Main,
    Roastery,
    Branch,
}

impl WarehouseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarehouseKind::Main => "main",
            WarehouseKind::Roastery => "roastery",
            WarehouseKind::Branch => "branch",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "main" => Some(WarehouseKind::Main),
            "roastery" => Some(WarehouseKind::Roastery),
            "branch" => Some(WarehouseKind::Branch),
            _ => None,
        }
    }
}

/// A warehouse, the roastery, or a retail branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub kind: WarehouseKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_storage_name() {
        for kind in [WarehouseKind::Main, WarehouseKind::Roastery, WarehouseKind::Branch] {
            assert_eq!(WarehouseKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(WarehouseKind::from_str("depot"), None);
    }
}
