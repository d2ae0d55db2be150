use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::{
    error::Outcome,
    model::SourceQuote,
    provider::{
        ProviderId, RateProvider,
        http::{get_json, require_key},
    },
};

/// ExchangeRate-API v6. The key and the base currency are path segments.
#[derive(Debug, Clone)]
pub struct ExchangeRateApiProvider {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ExchangeRateApiProvider {
    pub fn new(http: Client, base_url: String, api_key: Option<String>) -> Self {
        Self { http, base_url, api_key }
    }
}

#[derive(Debug, Deserialize)]
struct ErLatestResponse {
    conversion_rates: BTreeMap<String, f64>,
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    fn name(&self) -> &str {
        ProviderId::ExchangeRateApi.display_name()
    }

    async fn fetch_rates(&self, base: &str) -> Outcome<SourceQuote> {
        let api_key = require_key(self.name(), self.api_key.as_deref(), "EXCHANGERATE_API_KEY")?;

        let url = format!("{}/{}/latest/{}", self.base_url, api_key, base);
        let parsed: ErLatestResponse = get_json(self.name(), self.http.get(url)).await?;

        let values = parsed
            .conversion_rates
            .into_iter()
            .map(|(currency, rate)| (currency.to_uppercase(), rate))
            .collect();

        Ok(SourceQuote::new(self.name(), values))
    }
}
