use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::PricingConfig;
use crate::pricing::parse::{normalize_premiums, parse_spread_response};
use crate::pricing::{PremiumTable, PricingError, PricingSource, SpreadQuotes};

const SPREADS_SERVICE: &str = "GetPricesForProducts";
const PREMIUMS_SERVICE: &str = "GetPremiums";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;
const BODY_PREVIEW_CHARS: usize = 180;

pub struct HttpPricingSource {
    client: Client,
    base_url: String,
    api_token: String,
}

impl HttpPricingSource {
    pub fn new(config: &PricingConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(anyhow!("pricing base_url is not configured (set BASE_URL)"));
        }
        let client = Client::builder()
            .user_agent(concat!("premium-watch/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()
            .context("failed to build pricing HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn endpoint(&self, service: &str) -> String {
        format!("{}/FizServices/{service}/{}", self.base_url, self.api_token)
    }

    async fn post_codes(
        &self,
        service: &'static str,
        codes: &[String],
    ) -> Result<(StatusCode, String), PricingError> {
        let response = self
            .client
            .post(self.endpoint(service))
            .json(codes)
            .send()
            .await
            .map_err(|source| PricingError::Transport {
                endpoint: service,
                source,
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| PricingError::Transport {
                endpoint: service,
                source,
            })?;
        debug!("{service} returned {status} ({} bytes)", body.len());
        Ok((status, body))
    }
}

#[async_trait]
impl PricingSource for HttpPricingSource {
    async fn fetch_spreads(&self, codes: &[String]) -> Result<SpreadQuotes> {
        let (status, body) = self.post_codes(SPREADS_SERVICE, codes).await?;
        Ok(spreads_from_response(codes, status, &body))
    }

    async fn fetch_premiums(&self, codes: &[String]) -> Result<PremiumTable> {
        let (status, body) = self.post_codes(PREMIUMS_SERVICE, codes).await?;
        let table = premiums_from_response(status, &body)?;
        Ok(table)
    }
}

/// A bad status or body degrades to no quotes at all.
pub fn spreads_from_response(codes: &[String], status: StatusCode, body: &str) -> SpreadQuotes {
    if !status.is_success() {
        warn!("spread lookup returned {status}; all spreads unavailable");
        return SpreadQuotes::new();
    }
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            warn!("spread lookup returned invalid JSON: {err}");
            return SpreadQuotes::new();
        }
    };
    let quotes = parse_spread_response(codes, &value);
    info!("spread lookup: {}/{} codes quoted", quotes.len(), codes.len());
    quotes
}

/// Unlike spreads, a bad premium response fails the run.
pub fn premiums_from_response(
    status: StatusCode,
    body: &str,
) -> Result<PremiumTable, PricingError> {
    if !status.is_success() {
        let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
        return Err(PricingError::PremiumStatus {
            status: status.as_u16(),
            preview,
        });
    }
    let value: Value = serde_json::from_str(body).map_err(PricingError::PremiumBody)?;
    let table = normalize_premiums(&value);
    info!("premium lookup: {} codes returned", table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{premiums_from_response, spreads_from_response, HttpPricingSource};
    use crate::config::PricingConfig;
    use crate::pricing::PricingError;

    fn config(base_url: &str) -> PricingConfig {
        PricingConfig {
            base_url: base_url.to_string(),
            api_token: "tok".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn builds_service_endpoints() {
        let source = HttpPricingSource::new(&config("https://stage.example.com/")).expect("client");
        assert_eq!(
            source.endpoint("GetPremiums"),
            "https://stage.example.com/FizServices/GetPremiums/tok"
        );
    }

    #[test]
    fn requires_base_url() {
        assert!(HttpPricingSource::new(&config("  ")).is_err());
    }

    fn codes() -> Vec<String> {
        vec!["GE1".to_string(), "SR10".to_string()]
    }

    #[test]
    fn spread_error_status_degrades_to_no_quotes() {
        let body = r#"[{"tiers": {"1": {"spread": 1.5}}}]"#;
        let quotes = spreads_from_response(&codes(), StatusCode::BAD_GATEWAY, body);
        assert!(quotes.is_empty());
    }

    #[test]
    fn spread_invalid_json_degrades_to_no_quotes() {
        let quotes = spreads_from_response(&codes(), StatusCode::OK, "<html>maintenance</html>");
        assert!(quotes.is_empty());
    }

    #[test]
    fn spread_success_is_parsed() {
        let body = r#"[{"tiers": {"1": {"spread": 1.5}}}, {"tiers": {"1": {"spread": 2}}}]"#;
        let quotes = spreads_from_response(&codes(), StatusCode::OK, body);
        assert_eq!(quotes["GE1"].spread, Some(1.5));
        assert_eq!(quotes["SR10"].spread, Some(2.0));
    }

    #[test]
    fn premium_error_status_is_fatal_with_preview() {
        let body = "x".repeat(500);
        let err = premiums_from_response(StatusCode::UNAUTHORIZED, &body)
            .expect_err("status must fail");
        match err {
            PricingError::PremiumStatus { status, preview } => {
                assert_eq!(status, 401);
                assert_eq!(preview.len(), 180);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn premium_unparseable_body_is_fatal() {
        let err = premiums_from_response(StatusCode::OK, "not json").expect_err("body must fail");
        assert!(matches!(err, PricingError::PremiumBody(_)));
    }

    #[test]
    fn premium_success_is_normalized() {
        let body = r#"{"GE1": [{"fixedAskDelta": 12.5}]}"#;
        let table = premiums_from_response(StatusCode::OK, body).expect("table");
        assert_eq!(table["GE1"][0].fixed_ask, Some(12.5));
    }
}
