//! WebAssembly module for the Roastery Inventory Ledger
//!
//! Provides client-side computation for:
//! - Roast totals and waste while the batch form is being filled in
//! - Decoding `"type (w كجم), ..."` batch text
//! - Remaining balance of each output line of a batch
//! - Bag code preview for an intake

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

use shared::{
    batch_allocations, find_bean_type, intake_codes, parse_encoded_lines, AllocationOptions,
    OutputAllocation,
};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str("roastery inventory module loaded"));
}

/// Roast form contents sent from the browser
#[derive(Debug, Deserialize)]
pub struct RoastForm {
    pub inputs: Vec<BatchLine>,
    pub outputs: Vec<BatchLine>,
    #[serde(default)]
    pub reprocessed_kg: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct RoastFormTotals {
    #[serde(flatten)]
    pub totals: RoastTotals,
    pub is_high_waste: bool,
}

/// Errors carry the English and Arabic messages so the form can show either
#[derive(Debug, Serialize)]
pub struct FormError {
    pub field: String,
    pub message_en: String,
    pub message_ar: String,
}

impl From<LedgerViolation> for FormError {
    fn from(violation: LedgerViolation) -> Self {
        Self {
            field: violation.field().to_string(),
            message_en: violation.to_string(),
            message_ar: violation.message_ar(),
        }
    }
}

fn to_js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

pub fn roast_totals_impl(form_json: &str, threshold_kg: Decimal) -> Result<String, String> {
    let form: RoastForm =
        serde_json::from_str(form_json).map_err(|e| format!("Invalid roast JSON: {}", e))?;
    match validate_roast(&form.inputs, &form.outputs, form.reprocessed_kg) {
        Ok(totals) => to_json(&RoastFormTotals {
            is_high_waste: totals.is_high_waste(threshold_kg),
            totals,
        }),
        Err(violation) => Err(to_json(&FormError::from(violation))?),
    }
}

/// Validate a roast form and return its totals as JSON
#[wasm_bindgen]
pub fn roast_totals(form_json: &str, threshold_kg: f64) -> Result<String, JsValue> {
    let threshold = Decimal::try_from(threshold_kg).unwrap_or(Decimal::ZERO);
    roast_totals_impl(form_json, threshold).map_err(to_js_error)
}

/// Decode encoded batch text into `[{label, weight_kg}]` JSON
#[wasm_bindgen]
pub fn parse_batch_lines(text: &str) -> Result<String, JsValue> {
    to_json(&parse_encoded_lines(text)).map_err(to_js_error)
}

pub fn remaining_for_batch_impl(batch_json: &str, transfers_json: &str) -> Result<Vec<OutputAllocation>, String> {
    let batch: RoastBatch =
        serde_json::from_str(batch_json).map_err(|e| format!("Invalid batch JSON: {}", e))?;
    let transfers: Vec<BranchTransfer> = serde_json::from_str(transfers_json)
        .map_err(|e| format!("Invalid transfers JSON: {}", e))?;
    Ok(batch_allocations(&batch, &transfers, AllocationOptions::default()))
}

/// Allocation state of each output line of a batch, as JSON
#[wasm_bindgen]
pub fn remaining_for_batch(batch_json: &str, transfers_json: &str) -> Result<String, JsValue> {
    let allocations = remaining_for_batch_impl(batch_json, transfers_json).map_err(to_js_error)?;
    to_json(&allocations).map_err(to_js_error)
}

pub fn bag_codes_impl(bean_type: &str, count: usize, at: DateTime<Utc>) -> Result<Vec<String>, String> {
    let bean = find_bean_type(bean_type.trim())
        .ok_or_else(|| LedgerViolation::UnknownBeanType(bean_type.trim().to_string()).to_string())?;
    if count as u64 > MAX_INTAKE_BAGS as u64 {
        return Err(LedgerViolation::AboveLimit { field: "count", max: MAX_INTAKE_BAGS }.to_string());
    }
    Ok(intake_codes(bean.code, at, count))
}

/// Preview the codes an intake of `count` bags would receive now
#[wasm_bindgen]
pub fn bag_codes(bean_type: &str, count: usize) -> Result<String, JsValue> {
    let millis = js_sys::Date::now() as i64;
    let now = DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| to_js_error("Clock out of range"))?;
    let codes = bag_codes_impl(bean_type, count, now).map_err(to_js_error)?;
    to_json(&codes).map_err(to_js_error)
}
