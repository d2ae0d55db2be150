use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::{
    error::{Outcome, ProviderError},
    model::SourceQuote,
    provider::{ProviderId, RateProvider, http::get_json},
};

const DEFAULT_QUOTE_CURRENCIES: &[&str] =
    &["USD", "BTC", "ETH", "BNB", "SOL", "XRP", "ADA", "DOGE", "DOT", "MATIC", "LTC", "AVAX"];

/// CryptoCompare `pricemulti`.
#[derive(Debug, Clone)]
pub struct CryptoCompareProvider {
    http: Client,
    base_url: String,
    quote_currencies: Vec<String>,
}

impl CryptoCompareProvider {
    pub fn new(http: Client, base_url: String) -> Self {
        Self {
            http,
            base_url,
            quote_currencies: DEFAULT_QUOTE_CURRENCIES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn with_quote_currencies(mut self, currencies: Vec<String>) -> Self {
        self.quote_currencies = currencies;
        self
    }
}

#[async_trait]
impl RateProvider for CryptoCompareProvider {
    fn name(&self) -> &str {
        ProviderId::CryptoCompare.display_name()
    }

    async fn fetch_rates(&self, base: &str) -> Outcome<SourceQuote> {
        let fsym = base.to_uppercase();
        let tsyms = self.quote_currencies.join(",");

        let request = self
            .http
            .get(format!("{}/pricemulti", self.base_url))
            .query(&[("fsyms", fsym.as_str()), ("tsyms", tsyms.as_str())]);

        // Errors come back as HTTP 200 with `{"Response": "Error", ...}`, so the
        // body is inspected loosely before picking out the base section.
        let mut parsed: HashMap<String, Value> = get_json(self.name(), request).await?;

        let Some(Value::Object(prices)) = parsed.remove(&fsym) else {
            return Err(ProviderError::no_data(self.name(), base));
        };

        let values: BTreeMap<String, f64> = prices
            .into_iter()
            .filter_map(|(currency, price)| price.as_f64().map(|p| (currency.to_uppercase(), p)))
            .collect();

        Ok(SourceQuote::new(self.name(), values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    #[tokio::test]
    async fn reads_prices_for_uppercase_base() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pricemulti"))
            .and(query_param("fsyms", "ETH"))
            .and(query_param("tsyms", "USD,BTC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ETH": { "USD": 3100.25, "BTC": 0.0512 }
            })))
            .mount(&server)
            .await;

        let provider = CryptoCompareProvider::new(Client::new(), server.uri())
            .with_quote_currencies(vec!["USD".into(), "BTC".into()]);
        let quote = provider.fetch_rates("eth").await.unwrap();

        assert_eq!(quote.source, "CryptoCompare");
        assert_eq!(quote.values.get("USD"), Some(&3100.25));
        assert_eq!(quote.values.get("BTC"), Some(&0.0512));
    }

    #[tokio::test]
    async fn error_envelope_reports_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Response": "Error",
                "Message": "There is no data for any of the toSymbols"
            })))
            .mount(&server)
            .await;

        let provider = CryptoCompareProvider::new(Client::new(), server.uri());
        let err = provider.fetch_rates("NOPE").await.unwrap_err();

        assert_eq!(err, ProviderError::no_data("CryptoCompare", "NOPE"));
    }
}
