use crate::changes::{FieldValue, TrackedField};

/// `1234.5` → `$1,234.50`. Negative values keep the sign after the symbol.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));
    format!("${sign}{}.{fraction}", group_thousands(whole))
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

pub fn format_optional_currency(value: Option<f64>) -> String {
    value.map(format_currency).unwrap_or_default()
}

pub fn format_field_value(field: TrackedField, value: Option<&FieldValue>) -> String {
    match value {
        None => String::new(),
        Some(FieldValue::Mix(mix)) => mix.to_string(),
        Some(FieldValue::Number(n)) if field.is_percent() => format_percent(*n),
        Some(FieldValue::Number(n)) => format_currency(*n),
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
