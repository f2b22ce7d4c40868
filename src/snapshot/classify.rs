use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a product's price is adjusted relative to its reference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeltaMix {
    Percent,
    Fixed,
    Mix,
}

impl DeltaMix {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percent => "PERCENT",
            Self::Fixed => "FIXED",
            Self::Mix => "MIX",
        }
    }
}

impl Display for DeltaMix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown percent/fixed mix: {0}")]
pub struct DeltaMixParseError(pub String);

impl FromStr for DeltaMix {
    type Err = DeltaMixParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PERCENT" => Ok(Self::Percent),
            "FIXED" => Ok(Self::Fixed),
            "MIX" => Ok(Self::Mix),
            _ => Err(DeltaMixParseError(s.to_string())),
        }
    }
}

fn is_on(value: Option<f64>) -> bool {
    value.is_some_and(|v| v != 0.0)
}

/// Derives the delta structure from the four delta fields.
///
/// Rules are ordered exclusions, evaluated top to bottom: nothing on yields
/// `None`, all four on is `Mix`, percent-only is `Percent`, fixed-only is
/// `Fixed`, and any remaining percent+fixed combination is `Mix`.
pub fn classify(
    percent_bid: Option<f64>,
    percent_ask: Option<f64>,
    fixed_ask: Option<f64>,
    fixed_bid: Option<f64>,
) -> Option<DeltaMix> {
    let pb = is_on(percent_bid);
    let pa = is_on(percent_ask);
    let fa = is_on(fixed_ask);
    let fb = is_on(fixed_bid);

    let any_percent = pb || pa;
    let any_fixed = fa || fb;

    if !any_percent && !any_fixed {
        None
    } else if pb && pa && fa && fb {
        Some(DeltaMix::Mix)
    } else if any_percent && !any_fixed {
        Some(DeltaMix::Percent)
    } else if any_fixed && !any_percent {
        Some(DeltaMix::Fixed)
    } else {
        Some(DeltaMix::Mix)
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, DeltaMix};

    fn flags(pb: bool, pa: bool, fa: bool, fb: bool) -> Option<DeltaMix> {
        let on = |b: bool| if b { Some(0.5) } else { Some(0.0) };
        classify(on(pb), on(pa), on(fa), on(fb))
    }

    #[test]
    fn none_on_is_unclassified() {
        assert_eq!(flags(false, false, false, false), None);
    }

    #[test]
    fn percent_bid_only_is_percent() {
        assert_eq!(flags(true, false, false, false), Some(DeltaMix::Percent));
    }

    #[test]
    fn percent_ask_only_is_percent() {
        assert_eq!(flags(false, true, false, false), Some(DeltaMix::Percent));
    }

    #[test]
    fn both_percent_is_percent() {
        assert_eq!(flags(true, true, false, false), Some(DeltaMix::Percent));
    }

    #[test]
    fn fixed_ask_only_is_fixed() {
        assert_eq!(flags(false, false, true, false), Some(DeltaMix::Fixed));
    }

    #[test]
    fn fixed_bid_only_is_fixed() {
        assert_eq!(flags(false, false, false, true), Some(DeltaMix::Fixed));
    }

    #[test]
    fn both_fixed_is_fixed() {
        assert_eq!(flags(false, false, true, true), Some(DeltaMix::Fixed));
    }

    #[test]
    fn all_four_is_mix() {
        assert_eq!(flags(true, true, true, true), Some(DeltaMix::Mix));
    }

    #[test]
    fn percent_bid_and_fixed_ask_is_mix() {
        assert_eq!(flags(true, false, true, false), Some(DeltaMix::Mix));
    }

    #[test]
    fn percent_bid_and_fixed_bid_is_mix() {
        assert_eq!(flags(true, false, false, true), Some(DeltaMix::Mix));
    }

    #[test]
    fn percent_ask_and_fixed_ask_is_mix() {
        assert_eq!(flags(false, true, true, false), Some(DeltaMix::Mix));
    }

    #[test]
    fn percent_ask_and_fixed_bid_is_mix() {
        assert_eq!(flags(false, true, false, true), Some(DeltaMix::Mix));
    }

    #[test]
    fn both_percent_and_fixed_ask_is_mix() {
        assert_eq!(flags(true, true, true, false), Some(DeltaMix::Mix));
    }

    #[test]
    fn both_percent_and_fixed_bid_is_mix() {
        assert_eq!(flags(true, true, false, true), Some(DeltaMix::Mix));
    }

    #[test]
    fn percent_bid_and_both_fixed_is_mix() {
        assert_eq!(flags(true, false, true, true), Some(DeltaMix::Mix));
    }

    #[test]
    fn percent_ask_and_both_fixed_is_mix() {
        assert_eq!(flags(false, true, true, true), Some(DeltaMix::Mix));
    }

    #[test]
    fn absent_fields_count_as_off() {
        assert_eq!(classify(None, None, None, None), None);
        assert_eq!(
            classify(Some(0.02), Some(0.0), Some(0.0), Some(0.0)),
            Some(DeltaMix::Percent)
        );
        assert_eq!(classify(None, None, Some(-3.0), None), Some(DeltaMix::Fixed));
    }

    #[test]
    fn parses_stored_labels() {
        assert_eq!("PERCENT".parse::<DeltaMix>().ok(), Some(DeltaMix::Percent));
        assert_eq!("mix".parse::<DeltaMix>().ok(), Some(DeltaMix::Mix));
        assert!("PURE".parse::<DeltaMix>().is_err());
    }
}
