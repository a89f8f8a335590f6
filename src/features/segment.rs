//! Spending segment assigned from a customer's window statistics.

use serde::{Deserialize, Serialize};
use std::fmt;

const HIGH_VALUE_SUM: f64 = 10_000.0;
const HIGH_VALUE_COUNT: u64 = 20;
const ACTIVE_SUM: f64 = 5_000.0;
const ACTIVE_COUNT: u64 = 10;
const OCCASIONAL_HIGH_MEAN: f64 = 500.0;
const REGULAR_COUNT: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Segment {
    #[serde(rename = "Inactive")]
    Inactive,
    #[serde(rename = "High-Value Active")]
    HighValueActive,
    #[serde(rename = "Active")]
    Active,
    #[serde(rename = "High-Value Occasional")]
    HighValueOccasional,
    #[serde(rename = "Regular")]
    Regular,
    #[serde(rename = "Occasional")]
    Occasional,
}

impl Segment {
    /// First matching rule wins.
    pub fn classify(sum: f64, count: u64, mean: f64) -> Self {
        if sum == 0.0 {
            Segment::Inactive
        } else if sum > HIGH_VALUE_SUM && count > HIGH_VALUE_COUNT {
            Segment::HighValueActive
        } else if sum > ACTIVE_SUM || count > ACTIVE_COUNT {
            Segment::Active
        } else if mean > OCCASIONAL_HIGH_MEAN {
            Segment::HighValueOccasional
        } else if count > REGULAR_COUNT {
            Segment::Regular
        } else {
            Segment::Occasional
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Inactive => "Inactive",
            Segment::HighValueActive => "High-Value Active",
            Segment::Active => "Active",
            Segment::HighValueOccasional => "High-Value Occasional",
            Segment::Regular => "Regular",
            Segment::Occasional => "Occasional",
        }
    }

    pub fn all() -> [Segment; 6] {
        [
            Segment::Inactive,
            Segment::HighValueActive,
            Segment::Active,
            Segment::HighValueOccasional,
            Segment::Regular,
            Segment::Occasional,
        ]
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
