pub mod http;
pub mod parse;

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snapshot::DeltaFields;

pub use http::{premiums_from_response, spreads_from_response, HttpPricingSource};
pub use parse::{normalize_premiums, parse_spread_response};

/// Tier "1" figures for one product.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TierQuote {
    pub spread: Option<f64>,
    pub ask_price: Option<f64>,
    pub bid_price: Option<f64>,
}

/// Spread lookup keyed by API code. A code is absent when its response entry
/// was missing or not an object.
pub type SpreadQuotes = BTreeMap<String, TierQuote>;

/// Premium lookup keyed by API code, one entry per delta record in response order.
pub type PremiumTable = BTreeMap<String, Vec<DeltaFields>>;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("request to {endpoint} failed")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("premium lookup returned {status}: {preview}")]
    PremiumStatus { status: u16, preview: String },
    #[error("premium lookup returned an unparseable body")]
    PremiumBody(#[source] serde_json::Error),
}

#[async_trait]
pub trait PricingSource: Send + Sync {
    /// Never fails on a bad response body; only transport errors propagate.
    async fn fetch_spreads(&self, codes: &[String]) -> Result<SpreadQuotes>;
    /// Any non-success status or unparseable body is an error.
    async fn fetch_premiums(&self, codes: &[String]) -> Result<PremiumTable>;
}
