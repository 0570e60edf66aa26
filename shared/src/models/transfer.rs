//! Branch transfer models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Separator between the roast label and the operator note in `notes`
pub const NOTE_SEPARATOR: &str = " | ";

/// Roasted coffee sent from a batch output line to a branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchTransfer {
    pub id: Uuid,
    pub roasting_batch_id: Uuid,
    pub branch_id: Uuid,
    pub weight_kg: Decimal,
    /// Starts with the roast label the transfer draws against
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BranchTransfer {
    /// The roast label recorded in front of the operator note, if any
    pub fn roast_label(&self) -> Option<&str> {
        let notes = self.notes.as_deref()?;
        let label = notes.split(NOTE_SEPARATOR).next().unwrap_or(notes).trim();
        if label.is_empty() {
            None
        } else {
            Some(label)
        }
    }
}

/// A transfer to be inserted; the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBranchTransfer {
    pub roasting_batch_id: Uuid,
    pub branch_id: Uuid,
    pub weight_kg: Decimal,
    pub notes: String,
}

/// Compose transfer notes so the label can be re-attributed later
pub fn dispatch_notes(label: &str, note: &str) -> String {
    format!("{}{}{}", label, NOTE_SEPARATOR, note.trim())
}
