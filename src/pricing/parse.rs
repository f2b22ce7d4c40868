use serde_json::{Map, Value};
use tracing::warn;

use crate::pricing::{PremiumTable, SpreadQuotes, TierQuote};
use crate::snapshot::DeltaFields;

const SPREAD_PATHS: &[&str] = &["tiers.1.spread"];
const ASK_PATHS: &[&str] = &["tiers.1.askPrice", "tiers.1.askPercise"];
const BID_PATHS: &[&str] = &["tiers.1.bidPrice", "tiers.1.bidPercise"];

/// Matches spread entries to codes by position.
///
/// The endpoint echoes no code, so position `i` of the response is assumed to
/// belong to `codes[i]`. Codes past the end of a short response, and null or
/// non-object entries, are left out of the result.
pub fn parse_spread_response(codes: &[String], value: &Value) -> SpreadQuotes {
    let mut out = SpreadQuotes::new();
    let Some(entries) = value.as_array() else {
        warn!("spread response is not an array; all spreads unavailable");
        return out;
    };
    if entries.len() != codes.len() {
        warn!(
            "spread response has {} entries for {} requested codes",
            entries.len(),
            codes.len()
        );
    }

    for (code, entry) in codes.iter().zip(entries) {
        let Some(object) = entry.as_object() else {
            continue;
        };
        out.insert(
            code.clone(),
            TierQuote {
                spread: number_from_paths(object, SPREAD_PATHS),
                ask_price: number_from_paths(object, ASK_PATHS),
                bid_price: number_from_paths(object, BID_PATHS),
            },
        );
    }
    out
}

/// Flattens either premium response shape into one table.
///
/// The endpoint answers with `{code: [records]}` or with
/// `[{code: [records]}, {code: [records]}]`. Anything else is empty.
pub fn normalize_premiums(value: &Value) -> PremiumTable {
    let mut out = PremiumTable::new();
    match value {
        Value::Object(object) => merge_premium_object(&mut out, object),
        Value::Array(items) => {
            for item in items {
                if let Some(object) = item.as_object() {
                    merge_premium_object(&mut out, object);
                }
            }
        }
        _ => {}
    }
    out
}

fn merge_premium_object(out: &mut PremiumTable, object: &Map<String, Value>) {
    for (code, records) in object {
        out.insert(code.clone(), parse_delta_records(records));
    }
}

fn parse_delta_records(value: &Value) -> Vec<DeltaFields> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .map(parse_delta_record)
            .collect(),
        Value::Object(object) => vec![parse_delta_record(object)],
        _ => Vec::new(),
    }
}

fn parse_delta_record(object: &Map<String, Value>) -> DeltaFields {
    DeltaFields {
        percent_bid: number_from_paths(object, &["percentBidDelta"]),
        fixed_ask: number_from_paths(object, &["fixedAskDelta"]),
        percent_ask: number_from_paths(object, &["percentAskDelta"]),
        fixed_bid: number_from_paths(object, &["fixedBidDelta"]),
    }
}

fn number_from_paths(object: &Map<String, Value>, paths: &[&str]) -> Option<f64> {
    for path in paths {
        let Some(value) = object_path_value(object, path) else {
            continue;
        };
        if let Some(number) = to_f64(value) {
            return Some(number);
        }
    }
    None
}

fn object_path_value<'a>(object: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = object_get_case_insensitive(object, first)?;
    for segment in segments {
        let nested = current.as_object()?;
        current = object_get_case_insensitive(nested, segment)?;
    }
    Some(current)
}

fn object_get_case_insensitive<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).or_else(|| {
        object
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            // str::parse accepts "NaN" and "inf"
            let sanitized = s.trim().replace(',', "").replace('$', "");
            sanitized.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}
