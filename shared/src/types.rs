//! Common types used across the ledger

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal places every displayed or compared weight is rounded to
pub const WEIGHT_SCALE: u32 = 2;

/// Round a weight the way it is displayed
pub fn round_kg(weight: Decimal) -> Decimal {
    weight.round_dp(WEIGHT_SCALE)
}

/// Format a weight with two decimals, e.g. `50.00`
pub fn format_kg(weight: Decimal) -> String {
    format!("{:.2}", round_kg(weight))
}

/// Inclusive date range; either end may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Start of the `from` day
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.from
            .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)))
    }

    /// Last instant of the `to` day
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.to.map(|d| {
            Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)) + Duration::days(1)
                - Duration::milliseconds(1)
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start().map_or(true, |s| at >= s) && self.end().map_or(true, |e| at <= e)
    }
}

/// Calendar month filter; only applies when both parts are set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthFilter {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl MonthFilter {
    pub fn to_range(&self) -> Option<DateRange> {
        let (month, year) = (self.month?, self.year?);
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let last = next.pred_opt()?;
        Some(DateRange::new(Some(first), Some(last)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_kg_two_decimals() {
        assert_eq!(format_kg(Decimal::from(50)), "50.00");
        assert_eq!(format_kg(Decimal::from_str("12.345").unwrap()), "12.35");
        assert_eq!(format_kg(Decimal::from_str("0.1").unwrap()), "0.10");
    }

    #[test]
    fn test_date_range_end_is_inclusive() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let range = DateRange::new(Some(day), Some(day));
        let late = Utc.with_ymd_and_hms(2025, 3, 10, 23, 59, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap();
        assert!(range.contains(late));
        assert!(!range.contains(next));
        assert!(DateRange::default().contains(next));
    }

    #[test]
    fn test_month_filter_needs_both_parts() {
        assert!(MonthFilter { month: Some(2), year: None }.to_range().is_none());
        let feb = MonthFilter { month: Some(2), year: Some(2024) }.to_range().unwrap();
        assert_eq!(feb.to, NaiveDate::from_ymd_opt(2024, 2, 29));
        let dec = MonthFilter { month: Some(12), year: Some(2024) }.to_range().unwrap();
        assert_eq!(dec.to, NaiveDate::from_ymd_opt(2024, 12, 31));
        assert!(MonthFilter { month: Some(13), year: Some(2024) }.to_range().is_none());
    }
}
