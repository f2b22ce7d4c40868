pub mod builder;
pub mod classify;
pub mod migrations;
pub mod store;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use classify::{classify, DeltaMix};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DeltaFields {
    pub percent_bid: Option<f64>,
    pub fixed_ask: Option<f64>,
    pub percent_ask: Option<f64>,
    pub fixed_bid: Option<f64>,
}

impl DeltaFields {
    pub fn mix(&self) -> Option<DeltaMix> {
        classify(
            self.percent_bid,
            self.percent_ask,
            self.fixed_ask,
            self.fixed_bid,
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TroubleReason {
    LowConfidenceMatch,
    SpreadUnavailable,
    PremiumUnavailable,
}

impl TroubleReason {
    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::LowConfidenceMatch => "low_confidence_match",
            Self::SpreadUnavailable => "spread_unavailable",
            Self::PremiumUnavailable => "premium_unavailable",
        }
    }
}

impl Display for TroubleReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::LowConfidenceMatch => "low-confidence mapping",
            Self::SpreadUnavailable => "spread unavailable",
            Self::PremiumUnavailable => "premium unavailable",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown trouble reason: {0}")]
pub struct TroubleReasonParseError(pub String);

impl FromStr for TroubleReason {
    type Err = TroubleReasonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "low_confidence_match" => Ok(Self::LowConfidenceMatch),
            "spread_unavailable" => Ok(Self::SpreadUnavailable),
            "premium_unavailable" => Ok(Self::PremiumUnavailable),
            _ => Err(TroubleReasonParseError(s.to_string())),
        }
    }
}

/// Where a reading came from and what went wrong assembling it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Provenance {
    pub match_score: f64,
    pub reasons: Vec<TroubleReason>,
}

impl Provenance {
    pub fn new(match_score: f64) -> Self {
        Self {
            match_score,
            reasons: Vec::new(),
        }
    }

    pub fn flag(&mut self, reason: TroubleReason) {
        if !self.reasons.contains(&reason) {
            self.reasons.push(reason);
        }
    }

    pub fn is_troublesome(&self) -> bool {
        !self.reasons.is_empty()
    }

    pub fn reasons_label(&self) -> String {
        self.reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub product_name: Option<String>,
    pub api_code: String,
    pub spread: Option<f64>,
    pub deltas: DeltaFields,
    pub provenance: Provenance,
}

impl Snapshot {
    pub fn is_troublesome(&self) -> bool {
        self.provenance.is_troublesome()
    }

    pub fn percent_fixed_mix(&self) -> Option<DeltaMix> {
        self.deltas.mix()
    }

    /// Product name for display, falling back to the API code.
    pub fn label(&self) -> &str {
        match self.product_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.api_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DeltaFields, DeltaMix, Provenance, Snapshot, TroubleReason};

    #[test]
    fn mix_is_derived_from_deltas() {
        let snapshot = Snapshot {
            product_name: Some("1 oz Gold Eagle".to_string()),
            api_code: "GE1".to_string(),
            spread: Some(42.0),
            deltas: DeltaFields {
                percent_bid: Some(0.02),
                fixed_ask: Some(0.0),
                percent_ask: None,
                fixed_bid: None,
            },
            provenance: Provenance::new(1.0),
        };
        assert_eq!(snapshot.percent_fixed_mix(), Some(DeltaMix::Percent));
        assert!(!snapshot.is_troublesome());
        assert_eq!(snapshot.label(), "1 oz Gold Eagle");
    }

    #[test]
    fn label_falls_back_to_code() {
        let snapshot = Snapshot {
            product_name: None,
            api_code: "X1".to_string(),
            spread: None,
            deltas: DeltaFields::default(),
            provenance: Provenance::new(1.0),
        };
        assert_eq!(snapshot.label(), "X1");
    }

    #[test]
    fn flagging_is_idempotent() {
        let mut provenance = Provenance::new(0.8);
        provenance.flag(TroubleReason::LowConfidenceMatch);
        provenance.flag(TroubleReason::LowConfidenceMatch);
        provenance.flag(TroubleReason::SpreadUnavailable);
        assert_eq!(provenance.reasons.len(), 2);
        assert_eq!(
            provenance.reasons_label(),
            "low-confidence mapping, spread unavailable"
        );
        assert_eq!(
            "premium_unavailable".parse::<TroubleReason>().ok(),
            Some(TroubleReason::PremiumUnavailable)
        );
    }
}
