use crate::mapping::ProductMapping;
use crate::pricing::{PremiumTable, SpreadQuotes};
use crate::snapshot::{DeltaFields, Provenance, Snapshot, TroubleReason};

pub fn build_snapshots(
    mappings: &[ProductMapping],
    spreads: &SpreadQuotes,
    premiums: &PremiumTable,
) -> Vec<Snapshot> {
    mappings
        .iter()
        .map(|mapping| build_snapshot(mapping, spreads, premiums))
        .collect()
}

pub fn build_snapshot(
    mapping: &ProductMapping,
    spreads: &SpreadQuotes,
    premiums: &PremiumTable,
) -> Snapshot {
    let mut provenance = Provenance::new(mapping.match_score);
    if !mapping.is_exact_match() {
        provenance.flag(TroubleReason::LowConfidenceMatch);
    }

    let spread = spreads.get(&mapping.api_code).and_then(|quote| quote.spread);
    if spread.is_none() {
        provenance.flag(TroubleReason::SpreadUnavailable);
    }

    let deltas = match premiums.get(&mapping.api_code).and_then(|r| r.first()) {
        Some(first) => *first,
        None => {
            provenance.flag(TroubleReason::PremiumUnavailable);
            DeltaFields::default()
        }
    };

    Snapshot {
        product_name: mapping.product_name.clone(),
        api_code: mapping.api_code.clone(),
        spread,
        deltas,
        provenance,
    }
}
