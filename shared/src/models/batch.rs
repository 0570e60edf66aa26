//! Roasting batch models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One (type, weight) line of a batch: a green input or a roasted output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLine {
    /// Bean type for inputs, roast label for outputs
    pub label: String,
    pub weight_kg: Decimal,
}

impl BatchLine {
    pub fn new(label: impl Into<String>, weight_kg: Decimal) -> Self {
        Self {
            label: label.into(),
            weight_kg,
        }
    }
}

/// Which side of the roast a stored line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineDirection {
    Input,
    Output,
}

impl LineDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineDirection::Input => "input",
            LineDirection::Output => "output",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "input" => Some(LineDirection::Input),
            "output" => Some(LineDirection::Output),
            _ => None,
        }
    }
}

/// A recorded roasting event.
///
/// `bean_type` and `roast_type` hold the encoded `"type (w كجم), ..."`
/// text. Rows written before lines were normalized have empty `inputs`
/// and `outputs` and must be read through the encoded text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoastBatch {
    pub id: Uuid,
    pub bean_type: Option<String>,
    pub roast_type: Option<String>,
    pub input_weight_kg: Decimal,
    pub output_weight_kg: Decimal,
    pub reprocessed_weight_kg: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub inputs: Vec<BatchLine>,
    #[serde(default)]
    pub outputs: Vec<BatchLine>,
}

impl RoastBatch {
    /// Input minus roasted output minus reprocessed material
    pub fn waste_kg(&self) -> Decimal {
        self.input_weight_kg - self.output_weight_kg - self.reprocessed_weight_kg
    }

    /// Whether the row carries per-line structure, either normalized or encoded
    pub fn has_line_structure(&self) -> bool {
        !self.outputs.is_empty()
            || !self.inputs.is_empty()
            || self.bean_type.as_deref().is_some_and(|t| t.contains(')'))
            || self.roast_type.as_deref().is_some_and(|t| t.contains(')'))
    }
}

/// A batch to be inserted; the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRoastBatch {
    pub bean_type: String,
    pub roast_type: String,
    pub input_weight_kg: Decimal,
    pub output_weight_kg: Decimal,
    pub reprocessed_weight_kg: Decimal,
    pub notes: Option<String>,
    pub inputs: Vec<BatchLine>,
    pub outputs: Vec<BatchLine>,
}
