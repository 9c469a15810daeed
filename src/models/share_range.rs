//! Inclusive ranges of share numbers
//!
//! Certificates are displayed under a title built from their range, zero-
//! padded to the width of the highest issued share number (e.g. 001-050).

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShareRange {
    pub first: i64,
    pub last: i64,
}

impl ShareRange {
    pub fn new(first: i64, last: i64) -> Self {
        Self { first, last }
    }

    pub fn count(&self) -> i64 {
        self.last - self.first + 1
    }

    pub fn contains(&self, first: i64, last: i64) -> bool {
        self.first <= first && last <= self.last
    }

    /// Standard display title, both bounds zero-padded to `places` digits
    pub fn title(&self, places: usize) -> String {
        format!("{:0places$}-{:0places$}", self.first, self.last)
    }
}

/// Digit width used for range titles, from the highest issued number
pub fn title_width(last_issued: i64) -> usize {
    last_issued.to_string().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_is_inclusive() {
        assert_eq!(ShareRange::new(1, 50).count(), 50);
        assert_eq!(ShareRange::new(7, 7).count(), 1);
    }

    #[test]
    fn test_contains_requires_full_coverage() {
        let range = ShareRange::new(10, 20);
        assert!(range.contains(10, 20));
        assert!(range.contains(12, 15));
        assert!(!range.contains(9, 12));
        assert!(!range.contains(15, 21));
    }

    #[test]
    fn test_title_padding_follows_last_issued() {
        assert_eq!(ShareRange::new(1, 50).title(title_width(100)), "001-050");
        assert_eq!(ShareRange::new(1, 50).title(title_width(50)), "01-50");
        assert_eq!(ShareRange::new(7, 7).title(title_width(9)), "7-7");
    }

    #[test]
    fn test_serializes_as_plain_pair() {
        let json = serde_json::to_value(ShareRange::new(3, 9)).unwrap();
        assert_eq!(json["first"], 3);
        assert_eq!(json["last"], 9);
    }
}
