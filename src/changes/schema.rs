use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snapshot::{DeltaMix, Snapshot};

/// Snapshot fields compared between runs. Declaration order is report order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    Spread,
    PercentBid,
    FixedAsk,
    PercentAsk,
    FixedBid,
    PercentFixedMix,
}

impl TrackedField {
    pub const ALL: [TrackedField; 6] = [
        TrackedField::Spread,
        TrackedField::PercentBid,
        TrackedField::FixedAsk,
        TrackedField::PercentAsk,
        TrackedField::FixedBid,
        TrackedField::PercentFixedMix,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Spread => "spread",
            Self::PercentBid => "percent_bid",
            Self::FixedAsk => "fixed_ask",
            Self::PercentAsk => "percent_ask",
            Self::FixedBid => "fixed_bid",
            Self::PercentFixedMix => "percent_fixed_mix",
        }
    }

    pub fn is_percent(&self) -> bool {
        self.as_slug().contains("percent")
    }

    pub fn value_of(&self, snapshot: &Snapshot) -> Option<FieldValue> {
        let number = match self {
            Self::Spread => snapshot.spread,
            Self::PercentBid => snapshot.deltas.percent_bid,
            Self::FixedAsk => snapshot.deltas.fixed_ask,
            Self::PercentAsk => snapshot.deltas.percent_ask,
            Self::FixedBid => snapshot.deltas.fixed_bid,
            Self::PercentFixedMix => return snapshot.percent_fixed_mix().map(FieldValue::Mix),
        };
        number.map(FieldValue::Number)
    }
}

impl Display for TrackedField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Spread => "Spread",
            Self::PercentBid => "Percent Bid",
            Self::FixedAsk => "Fixed Ask",
            Self::PercentAsk => "Percent Ask",
            Self::FixedBid => "Fixed Bid",
            Self::PercentFixedMix => "Percent/Fixed Mix",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown tracked field: {0}")]
pub struct TrackedFieldParseError(pub String);

impl FromStr for TrackedField {
    type Err = TrackedFieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|field| field.as_slug() == normalized)
            .ok_or_else(|| TrackedFieldParseError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Mix(DeltaMix),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Mix(_) => None,
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Mix(mix) => write!(f, "{mix}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldChange {
    pub product: String,
    pub previous_value: Option<FieldValue>,
    pub current_value: Option<FieldValue>,
}

/// Per-field change lists. Every tracked field is always present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Changeset {
    changes: BTreeMap<TrackedField, Vec<FieldChange>>,
}

impl Changeset {
    pub fn empty() -> Self {
        Self {
            changes: TrackedField::ALL
                .into_iter()
                .map(|field| (field, Vec::new()))
                .collect(),
        }
    }

    pub fn push(&mut self, field: TrackedField, change: FieldChange) {
        self.changes.entry(field).or_default().push(change);
    }

    pub fn get(&self, field: TrackedField) -> &[FieldChange] {
        self.changes.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrackedField, &[FieldChange])> {
        TrackedField::ALL
            .into_iter()
            .map(move |field| (field, self.get(field)))
    }

    pub fn total_changes(&self) -> usize {
        self.changes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
    }
}

impl Default for Changeset {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Changeset, FieldChange, FieldValue, TrackedField};
    use crate::snapshot::DeltaMix;

    #[test]
    fn empty_changeset_has_all_six_categories() {
        let changeset = Changeset::empty();
        assert_eq!(changeset.iter().count(), 6);
        assert!(changeset.is_empty());
        let rendered = serde_json::to_value(&changeset).expect("serialize");
        assert_eq!(
            rendered,
            json!({
                "spread": [],
                "percent_bid": [],
                "fixed_ask": [],
                "percent_ask": [],
                "fixed_bid": [],
                "percent_fixed_mix": []
            })
        );
    }

    #[test]
    fn serializes_values_untagged() {
        let mut changeset = Changeset::empty();
        changeset.push(
            TrackedField::PercentFixedMix,
            FieldChange {
                product: "GE1".to_string(),
                previous_value: None,
                current_value: Some(FieldValue::Mix(DeltaMix::Fixed)),
            },
        );
        let rendered = serde_json::to_value(&changeset).expect("serialize");
        assert_eq!(
            rendered["percent_fixed_mix"][0],
            json!({"product": "GE1", "previous_value": null, "current_value": "FIXED"})
        );
    }

    #[test]
    fn percent_fields_are_detected_by_slug() {
        let percent: Vec<_> = TrackedField::ALL
            .into_iter()
            .filter(TrackedField::is_percent)
            .collect();
        assert_eq!(
            percent,
            vec![
                TrackedField::PercentBid,
                TrackedField::PercentAsk,
                TrackedField::PercentFixedMix
            ]
        );
        assert_eq!("fixed-ask".parse::<TrackedField>().ok(), Some(TrackedField::FixedAsk));
    }
}
