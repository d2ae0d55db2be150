use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::{
    error::{Outcome, ProviderError},
    model::SourceQuote,
    provider::{ProviderId, RateProvider, http::get_json},
};

/// fawazahmed0 currency-api. Serves `<base>.json` with rates nested under the
/// lowercase base code.
#[derive(Debug, Clone)]
pub struct CurrencyApiProvider {
    http: Client,
    base_url: String,
}

impl CurrencyApiProvider {
    pub fn new(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl RateProvider for CurrencyApiProvider {
    fn name(&self) -> &str {
        ProviderId::CurrencyApi.display_name()
    }

    async fn fetch_rates(&self, base: &str) -> Outcome<SourceQuote> {
        let lower = base.to_lowercase();
        let url = format!("{}/{}.json", self.base_url, lower);

        let mut parsed: HashMap<String, Value> = get_json(self.name(), self.http.get(url)).await?;

        let Some(Value::Object(rates)) = parsed.remove(&lower) else {
            return Err(ProviderError::malformed(
                self.name(),
                format!("invalid data structure for {base}"),
            ));
        };

        // Non-numeric entries are skipped rather than failing the whole quote.
        let values: BTreeMap<String, f64> = rates
            .into_iter()
            .filter_map(|(currency, rate)| rate.as_f64().map(|r| (currency.to_uppercase(), r)))
            .collect();

        Ok(SourceQuote::new(self.name(), values))
    }
}
