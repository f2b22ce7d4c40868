use anyhow::Result;

use crate::changes::Changeset;
use crate::pipeline::RunSummary;
use crate::report::format::format_field_value;
use crate::snapshot::Snapshot;

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn snapshots_to_csv(snapshots: &[Snapshot]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "product_name",
        "api_code",
        "spread",
        "percent_bid",
        "fixed_ask",
        "percent_ask",
        "fixed_bid",
        "match_score",
        "is_troublesome",
        "percent_fixed_mix",
    ])?;
    for s in snapshots {
        writer.write_record([
            s.product_name.clone().unwrap_or_default(),
            s.api_code.clone(),
            optional(s.spread),
            optional(s.deltas.percent_bid),
            optional(s.deltas.fixed_ask),
            optional(s.deltas.percent_ask),
            optional(s.deltas.fixed_bid),
            s.provenance.match_score.to_string(),
            s.is_troublesome().to_string(),
            s.percent_fixed_mix()
                .map(|m| m.to_string())
                .unwrap_or_default(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn changeset_to_csv(changeset: &Changeset) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["field", "product", "previous", "current"])?;
    for (field, changes) in changeset.iter() {
        for change in changes {
            writer.write_record([
                field.as_slug().to_string(),
                change.product.clone(),
                format_field_value(field, change.previous_value.as_ref()),
                format_field_value(field, change.current_value.as_ref()),
            ])?;
        }
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn summary_to_csv(summary: &RunSummary) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "generated_at",
        "products",
        "troublesome",
        "changes",
        "delivered",
    ])?;
    writer.write_record([
        summary.generated_at.format("%Y-%m-%d %H:%M").to_string(),
        summary.products.to_string(),
        summary
            .troublesome
            .iter()
            .map(|t| t.api_code.as_str())
            .collect::<Vec<_>>()
            .join("|"),
        summary.changes.to_string(),
        summary.delivered.to_string(),
    ])?;
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

#[cfg(test)]
mod tests {
    use super::changeset_to_csv;
    use crate::changes::{Changeset, FieldChange, FieldValue, TrackedField};

    #[test]
    fn changeset_csv_quotes_formatted_values() {
        let mut changeset = Changeset::empty();
        changeset.push(
            TrackedField::FixedAsk,
            FieldChange {
                product: "Kilo Bar".to_string(),
                previous_value: Some(FieldValue::Number(1200.0)),
                current_value: None,
            },
        );
        let rendered = changeset_to_csv(&changeset).expect("csv");
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[0], "field,product,previous,current");
        assert_eq!(lines[1], "fixed_ask,Kilo Bar,\"$1,200.00\",");
    }
}
