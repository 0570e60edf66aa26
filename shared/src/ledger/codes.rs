//! Bag code generation

use chrono::{DateTime, Utc};

/// Prefix of codes given to reprocessed bags
pub const REPROCESS_CODE_PREFIX: &str = "REPROCESS";

/// `YYMMDD_HHMMSS_mmm` for the given instant
pub fn unique_suffix(at: DateTime<Utc>) -> String {
    at.format("%y%m%d_%H%M%S_%3f").to_string()
}

/// `<typeCode>_<suffix>_<sequence>`; sequence numbers start at 1
pub fn compose_bag_code(type_code: &str, suffix: &str, sequence: usize) -> String {
    format!("{}_{}_{}", type_code, suffix, sequence)
}

/// Codes for `count` bags minted together at `at`
pub fn intake_codes(type_code: &str, at: DateTime<Utc>, count: usize) -> Vec<String> {
    let suffix = unique_suffix(at);
    (1..=count)
        .map(|seq| compose_bag_code(type_code, &suffix, seq))
        .collect()
}

/// `REPROCESS-<unix millis>`
pub fn reprocess_code(at: DateTime<Utc>) -> String {
    format!("{}-{}", REPROCESS_CODE_PREFIX, at.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 7, 9, 5, 3).unwrap() + chrono::Duration::milliseconds(42)
    }

    #[test]
    fn test_unique_suffix_format() {
        assert_eq!(unique_suffix(instant()), "250107_090503_042");
    }

    #[test]
    fn test_intake_codes_are_distinct_and_sequenced() {
        let codes = intake_codes("YEM", instant(), 3);
        assert_eq!(
            codes,
            vec![
                "YEM_250107_090503_042_1",
                "YEM_250107_090503_042_2",
                "YEM_250107_090503_042_3",
            ]
        );
        let unique: HashSet<_> = intake_codes("IND", instant(), 40).into_iter().collect();
        assert_eq!(unique.len(), 40);
    }

    #[test]
    fn test_successive_intakes_differ_at_millisecond_resolution() {
        let a = intake_codes("IND", instant(), 1);
        let b = intake_codes("IND", instant() + chrono::Duration::milliseconds(1), 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_reprocess_code() {
        assert_eq!(reprocess_code(instant()), format!("REPROCESS-{}", instant().timestamp_millis()));
    }
}
