pub mod format;
pub mod html;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::mapping::ProductMapping;
use crate::pricing::SpreadQuotes;

pub use html::render_report;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRow {
    pub product: String,
    pub ask_price: Option<f64>,
    pub bid_price: Option<f64>,
}

/// Current ask/bid per mapped product, in mapping order.
pub fn price_rows(mappings: &[ProductMapping], spreads: &SpreadQuotes) -> Vec<PriceRow> {
    mappings
        .iter()
        .map(|mapping| {
            let quote = spreads.get(&mapping.api_code);
            PriceRow {
                product: mapping.product_name.clone().unwrap_or_default(),
                ask_price: quote.and_then(|q| q.ask_price),
                bid_price: quote.and_then(|q| q.bid_price),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub subject: String,
    pub html: String,
    pub generated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::price_rows;
    use crate::mapping::ProductMapping;
    use crate::pricing::{SpreadQuotes, TierQuote};

    #[test]
    fn prices_follow_mapping_order_and_tolerate_gaps() {
        let mappings = vec![
            ProductMapping {
                product_name: Some("Eagle".to_string()),
                api_code: "GE1".to_string(),
                match_score: 1.0,
            },
            ProductMapping {
                product_name: None,
                api_code: "SR10".to_string(),
                match_score: 1.0,
            },
        ];
        let mut spreads = SpreadQuotes::new();
        spreads.insert(
            "GE1".to_string(),
            TierQuote {
                spread: Some(30.0),
                ask_price: Some(2050.0),
                bid_price: Some(2020.0),
            },
        );

        let rows = price_rows(&mappings, &spreads);
        assert_eq!(rows[0].product, "Eagle");
        assert_eq!(rows[0].ask_price, Some(2050.0));
        assert_eq!(rows[1].product, "");
        assert_eq!(rows[1].bid_price, None);
    }
}
