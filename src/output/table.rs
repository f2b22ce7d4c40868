use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::changes::Changeset;
use crate::pipeline::RunSummary;
use crate::report::format::{format_currency, format_field_value, format_percent};
use crate::snapshot::Snapshot;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

pub fn render_snapshot_table(snapshots: &[Snapshot]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Product",
        "Code",
        "Spread",
        "% Bid",
        "Fixed Ask",
        "% Ask",
        "Fixed Bid",
        "Mix",
        "Troublesome",
    ]);
    for s in snapshots {
        let trouble_cell = if s.is_troublesome() {
            Cell::new(s.provenance.reasons_label()).fg(Color::Red)
        } else {
            Cell::new("no").fg(Color::Green)
        };
        table.add_row(Row::from(vec![
            Cell::new(s.label()),
            Cell::new(&s.api_code),
            Cell::new(or_dash(s.spread.map(format_currency))),
            Cell::new(or_dash(s.deltas.percent_bid.map(format_percent))),
            Cell::new(or_dash(s.deltas.fixed_ask.map(format_currency))),
            Cell::new(or_dash(s.deltas.percent_ask.map(format_percent))),
            Cell::new(or_dash(s.deltas.fixed_bid.map(format_currency))),
            Cell::new(or_dash(s.percent_fixed_mix().map(|m| m.to_string()))),
            trouble_cell,
        ]));
    }
    table.to_string()
}

pub fn render_changeset_table(changeset: &Changeset) -> String {
    if changeset.is_empty() {
        return "No changes.".to_string();
    }
    let mut table = new_table();
    table.set_header(vec!["Field", "Product", "Previous", "Current"]);
    for (field, changes) in changeset.iter() {
        for change in changes {
            table.add_row(vec![
                field.to_string(),
                change.product.clone(),
                format_field_value(field, change.previous_value.as_ref()),
                format_field_value(field, change.current_value.as_ref()),
            ]);
        }
    }
    table.to_string()
}

pub fn render_summary_table(summary: &RunSummary) -> String {
    let mut table = new_table();
    table.set_header(vec!["Run", "Products", "Troublesome", "Changes", "Delivered"]);
    let delivered = if summary.delivered {
        Cell::new("YES").fg(Color::Green)
    } else {
        Cell::new("NO").fg(Color::Red)
    };
    table.add_row(Row::from(vec![
        Cell::new(summary.generated_at.format("%Y-%m-%d %H:%M").to_string()),
        Cell::new(summary.products.to_string()),
        Cell::new(summary.troublesome.len().to_string()),
        Cell::new(summary.changes.to_string()),
        delivered,
    ]));

    let mut out = table.to_string();
    for item in &summary.troublesome {
        let reasons = item
            .reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("\n  {} ({}): {reasons}", item.product, item.api_code));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::render_changeset_table;
    use crate::changes::{Changeset, FieldChange, FieldValue, TrackedField};

    #[test]
    fn empty_changeset_prints_placeholder() {
        assert_eq!(render_changeset_table(&Changeset::empty()), "No changes.");
    }

    #[test]
    fn changeset_table_lists_field_and_values() {
        let mut changeset = Changeset::empty();
        changeset.push(
            TrackedField::PercentAsk,
            FieldChange {
                product: "Eagle".to_string(),
                previous_value: Some(FieldValue::Number(1.0)),
                current_value: Some(FieldValue::Number(1.25)),
            },
        );
        let rendered = render_changeset_table(&changeset);
        assert!(rendered.contains("Percent Ask"));
        assert!(rendered.contains("1.25%"));
    }
}
