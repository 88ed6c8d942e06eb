//! Fixed bucket filters over glycan GU and mass values.
//!
//! Every bucket is half-open, `[min, max)`; the last bucket of each family
//! has no upper bound. A value sitting exactly on an upper bound therefore
//! belongs to the next bucket.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {family} range '{key}' (expected one of: {expected})")]
pub struct RangeParseError {
    pub family: &'static str,
    pub key: String,
    pub expected: String,
}

/// A family of named value buckets.
pub trait RangeBucket: Sized + Copy + 'static {
    /// Human-readable family name used in errors.
    const FAMILY: &'static str;
    const ALL: &'static [Self];

    /// Filter key, e.g. `"2-5"`.
    fn key(&self) -> &'static str;

    /// Display label, e.g. `"2.0 - 5.0"`.
    fn label(&self) -> &'static str;

    /// Inclusive lower bound and exclusive upper bound (None = unbounded).
    fn bounds(&self) -> (f64, Option<f64>);

    fn contains(&self, value: f64) -> bool {
        let (min, max) = self.bounds();
        value >= min && max.map_or(true, |max| value < max)
    }

    /// The bucket `value` falls in, if any.
    fn classify(value: f64) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.contains(value))
    }

    fn from_key(key: &str) -> Result<Self, RangeParseError> {
        Self::ALL
            .iter()
            .copied()
            .find(|b| b.key() == key)
            .ok_or_else(|| RangeParseError {
                family: Self::FAMILY,
                key: key.to_string(),
                expected: Self::ALL
                    .iter()
                    .map(|b| b.key())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuRange {
    ZeroToTwo,
    TwoToFive,
    FiveToSeven,
    SevenToTen,
    AboveTen,
}

impl RangeBucket for GuRange {
    const FAMILY: &'static str = "GU";
    const ALL: &'static [Self] = &[
        GuRange::ZeroToTwo,
        GuRange::TwoToFive,
        GuRange::FiveToSeven,
        GuRange::SevenToTen,
        GuRange::AboveTen,
    ];

    fn key(&self) -> &'static str {
        match self {
            GuRange::ZeroToTwo => "0-2",
            GuRange::TwoToFive => "2-5",
            GuRange::FiveToSeven => "5-7",
            GuRange::SevenToTen => "7-10",
            GuRange::AboveTen => "10+",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            GuRange::ZeroToTwo => "0.0 - 2.0",
            GuRange::TwoToFive => "2.0 - 5.0",
            GuRange::FiveToSeven => "5.0 - 7.0",
            GuRange::SevenToTen => "7.0 - 10.0",
            GuRange::AboveTen => "> 10.0",
        }
    }

    fn bounds(&self) -> (f64, Option<f64>) {
        match self {
            GuRange::ZeroToTwo => (0.0, Some(2.0)),
            GuRange::TwoToFive => (2.0, Some(5.0)),
            GuRange::FiveToSeven => (5.0, Some(7.0)),
            GuRange::SevenToTen => (7.0, Some(10.0)),
            GuRange::AboveTen => (10.0, None),
        }
    }
}

impl FromStr for GuRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassRange {
    UpTo500,
    From500To1000,
    From1000To1500,
    From1500To2000,
    Above2000,
}

impl RangeBucket for MassRange {
    const FAMILY: &'static str = "mass";
    const ALL: &'static [Self] = &[
        MassRange::UpTo500,
        MassRange::From500To1000,
        MassRange::From1000To1500,
        MassRange::From1500To2000,
        MassRange::Above2000,
    ];

    fn key(&self) -> &'static str {
        match self {
            MassRange::UpTo500 => "0-500",
            MassRange::From500To1000 => "500-1000",
            MassRange::From1000To1500 => "1000-1500",
            MassRange::From1500To2000 => "1500-2000",
            MassRange::Above2000 => "2000+",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MassRange::UpTo500 => "0 - 500",
            MassRange::From500To1000 => "500 - 1000",
            MassRange::From1000To1500 => "1000 - 1500",
            MassRange::From1500To2000 => "1500 - 2000",
            MassRange::Above2000 => "> 2000",
        }
    }

    fn bounds(&self) -> (f64, Option<f64>) {
        match self {
            MassRange::UpTo500 => (0.0, Some(500.0)),
            MassRange::From500To1000 => (500.0, Some(1000.0)),
            MassRange::From1000To1500 => (1000.0, Some(1500.0)),
            MassRange::From1500To2000 => (1500.0, Some(2000.0)),
            MassRange::Above2000 => (2000.0, None),
        }
    }
}

impl FromStr for MassRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gu_edges() {
        assert_eq!(GuRange::classify(0.0), Some(GuRange::ZeroToTwo));
        assert_eq!(GuRange::classify(1.999), Some(GuRange::ZeroToTwo));
        assert_eq!(GuRange::classify(2.0), Some(GuRange::TwoToFive));
        assert_eq!(GuRange::classify(4.999), Some(GuRange::TwoToFive));
        assert_eq!(GuRange::classify(5.0), Some(GuRange::FiveToSeven));
        assert_eq!(GuRange::classify(7.0), Some(GuRange::SevenToTen));
        assert_eq!(GuRange::classify(9.999), Some(GuRange::SevenToTen));
        assert_eq!(GuRange::classify(10.0), Some(GuRange::AboveTen));
        assert_eq!(GuRange::classify(250.0), Some(GuRange::AboveTen));
    }

    #[test]
    fn test_upper_bound_is_exclusive() {
        assert!(!GuRange::TwoToFive.contains(5.0));
        assert!(GuRange::FiveToSeven.contains(5.0));
        assert!(!MassRange::From1000To1500.contains(1500.0));
        assert!(MassRange::From1500To2000.contains(1500.0));
    }

    #[test]
    fn test_negative_values_fall_outside() {
        assert_eq!(GuRange::classify(-0.1), None);
        assert_eq!(MassRange::classify(-1.0), None);
    }

    #[test]
    fn test_mass_edges() {
        assert_eq!(MassRange::classify(0.0), Some(MassRange::UpTo500));
        assert_eq!(MassRange::classify(500.0), Some(MassRange::From500To1000));
        assert_eq!(MassRange::classify(1000.0), Some(MassRange::From1000To1500));
        assert_eq!(MassRange::classify(1999.99), Some(MassRange::From1500To2000));
        assert_eq!(MassRange::classify(2000.0), Some(MassRange::Above2000));
    }

    #[test]
    fn test_keys_parse() {
        for bucket in GuRange::ALL {
            assert_eq!(bucket.key().parse::<GuRange>().unwrap(), *bucket);
        }
        assert_eq!("1000-1500".parse::<MassRange>().unwrap(), MassRange::From1000To1500);
        let err = "3-4".parse::<GuRange>().unwrap_err();
        assert_eq!(err.family, "GU");
        assert!(err.to_string().contains("0-2, 2-5, 5-7, 7-10, 10+"));
    }

    #[test]
    fn test_labels() {
        assert_eq!(GuRange::AboveTen.label(), "> 10.0");
        assert_eq!(MassRange::UpTo500.label(), "0 - 500");
    }
}
