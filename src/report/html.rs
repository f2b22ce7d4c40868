use chrono::NaiveDateTime;

use crate::changes::{Changeset, FieldChange, TrackedField};
use crate::report::format::{escape_html, format_field_value, format_optional_currency};
use crate::report::{PriceRow, Report, TIMESTAMP_FORMAT};

const TABLE_OPEN: &str = "<table border='1' cellspacing='0' cellpadding='4'>";
const HEADER_STYLE: &str = "background-color:#e0e0e0;";

pub fn render_report(
    changeset: &Changeset,
    prices: &[PriceRow],
    generated_at: NaiveDateTime,
) -> Report {
    let stamp = generated_at.format(TIMESTAMP_FORMAT).to_string();
    Report {
        subject: format!("Changes as of {stamp}"),
        html: render_html(changeset, prices, &stamp),
        generated_at,
    }
}

fn render_html(changeset: &Changeset, prices: &[PriceRow], stamp: &str) -> String {
    let mut html = vec![
        "<html>".to_string(),
        "<body>".to_string(),
        format!("<h2>Changes Report - {stamp}</h2>"),
        "<hr>".to_string(),
    ];

    for (field, changes) in changeset.iter() {
        let title = format!("Changes in {field}");
        html.push(format!("<h3>{}</h3>", escape_html(&title)));
        if changes.is_empty() {
            html.push(format!(
                "<p>No changes in {}.</p>",
                escape_html(&field.to_string().to_lowercase())
            ));
        } else {
            render_change_table(&mut html, field, changes);
        }
        html.push("<br>".to_string());
    }

    html.push("<h3>Current Ask &amp; Bid Prices</h3>".to_string());
    html.push(TABLE_OPEN.to_string());
    html.push(format!(
        "<tr style='{HEADER_STYLE}'><th>Product</th><th>Ask Price</th><th>Bid Price</th></tr>"
    ));
    for row in prices {
        html.push(format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&row.product),
            format_optional_currency(row.ask_price),
            format_optional_currency(row.bid_price)
        ));
    }
    html.push("</table>".to_string());
    html.push("</body>".to_string());
    html.push("</html>".to_string());
    html.join("\n")
}

fn render_change_table(html: &mut Vec<String>, field: TrackedField, changes: &[FieldChange]) {
    html.push(TABLE_OPEN.to_string());
    html.push(format!(
        "<tr style='{HEADER_STYLE}'><th>Product</th><th>Previous</th><th>Current</th></tr>"
    ));
    for change in changes {
        html.push(format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&change.product),
            format_field_value(field, change.previous_value.as_ref()),
            format_field_value(field, change.current_value.as_ref())
        ));
    }
    html.push("</table>".to_string());
}
