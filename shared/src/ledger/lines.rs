//! Encoding of batch lines as `"type (w كجم), type (w كجم)"` text
//!
//! Batches carry their lines in a normalized relation; the encoded text is
//! still written for display and is the only source of lines for rows that
//! predate the relation.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::models::BatchLine;
use crate::types::format_kg;

/// Unit suffix used inside encoded lines
pub const KG_UNIT: &str = "كجم";

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([^,]+)\s*\(([\d.]+)\s*كجم\)").expect("line pattern is valid")
    })
}

fn item_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(.+?)\s*\(([\d.,]+)\s*كجم\)?").expect("item pattern is valid")
    })
}

fn parenthetical() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\(.*?\)").expect("parenthetical pattern is valid"))
}

/// Encode lines as `"<label> (<w:.2> كجم), ..."`
pub fn encode_lines(lines: &[BatchLine]) -> String {
    lines
        .iter()
        .map(|l| format!("{} ({} {})", l.label.trim(), format_kg(l.weight_kg), KG_UNIT))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decode every `name (<weight> كجم)` occurrence in `text`
pub fn parse_encoded_lines(text: &str) -> Vec<BatchLine> {
    line_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let label = caps.get(1)?.as_str().trim();
            let weight = Decimal::from_str(caps.get(2)?.as_str()).ok()?;
            Some(BatchLine::new(label, weight))
        })
        .collect()
}

/// Decode one comma-separated item; items without a weight get zero
pub fn parse_item(item: &str) -> BatchLine {
    let item = item.trim();
    match item_pattern().captures(item) {
        Some(caps) => {
            let label = caps.get(1).map_or(item, |m| m.as_str()).trim();
            let weight = caps
                .get(2)
                .and_then(|m| Decimal::from_str(&m.as_str().replace(',', ".")).ok())
                .unwrap_or(Decimal::ZERO);
            BatchLine::new(label, weight)
        }
        None => BatchLine::new(item, Decimal::ZERO),
    }
}

/// Label with every parenthetical removed, trimmed
pub fn clean_label(raw: &str) -> String {
    parenthetical().replace_all(raw, "").trim().to_string()
}

/// Lower-case, underscore-joined label usable inside an identifier
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

pub fn total_weight(lines: &[BatchLine]) -> Decimal {
    lines.iter().map(|l| l.weight_kg).sum()
}
