use anyhow::Result;
use serde::Serialize;

use crate::snapshot::{DeltaMix, Snapshot, TroubleReason};

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Flat row shape with the derived columns filled in.
#[derive(Debug, Serialize)]
pub struct SnapshotRow<'a> {
    pub product_name: Option<&'a str>,
    pub api_code: &'a str,
    pub spread: Option<f64>,
    pub percent_bid: Option<f64>,
    pub fixed_ask: Option<f64>,
    pub percent_ask: Option<f64>,
    pub fixed_bid: Option<f64>,
    pub match_score: f64,
    pub is_troublesome: bool,
    pub trouble_reasons: &'a [TroubleReason],
    pub percent_fixed_mix: Option<DeltaMix>,
}

impl<'a> From<&'a Snapshot> for SnapshotRow<'a> {
    fn from(s: &'a Snapshot) -> Self {
        Self {
            product_name: s.product_name.as_deref(),
            api_code: &s.api_code,
            spread: s.spread,
            percent_bid: s.deltas.percent_bid,
            fixed_ask: s.deltas.fixed_ask,
            percent_ask: s.deltas.percent_ask,
            fixed_bid: s.deltas.fixed_bid,
            match_score: s.provenance.match_score,
            is_troublesome: s.is_troublesome(),
            trouble_reasons: &s.provenance.reasons,
            percent_fixed_mix: s.percent_fixed_mix(),
        }
    }
}

pub fn render_snapshots_json(snapshots: &[Snapshot]) -> Result<String> {
    let rows: Vec<SnapshotRow<'_>> = snapshots.iter().map(SnapshotRow::from).collect();
    render_json(&rows)
}

#[cfg(test)]
mod tests {
    use super::render_snapshots_json;
    use crate::snapshot::{DeltaFields, Provenance, Snapshot, TroubleReason};

    #[test]
    fn snapshot_rows_include_derived_columns() {
        let mut provenance = Provenance::new(1.0);
        provenance.flag(TroubleReason::PremiumUnavailable);
        let snapshot = Snapshot {
            product_name: Some("Eagle".to_string()),
            api_code: "GE1".to_string(),
            spread: Some(1.5),
            deltas: DeltaFields {
                fixed_bid: Some(2.0),
                ..DeltaFields::default()
            },
            provenance,
        };
        let rendered = render_snapshots_json(&[snapshot]).expect("json");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("parse");
        assert_eq!(value[0]["is_troublesome"], true);
        assert_eq!(value[0]["percent_fixed_mix"], "FIXED");
        assert_eq!(value[0]["trouble_reasons"][0], "premium_unavailable");
    }
}
