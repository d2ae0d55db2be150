//! Providers answering `GET <path>?<param>=<BASE>` with `{ "base": .., "rates": {..} }`.
//!
//! Frankfurter, Exchangerate.host and VATComply all share this shape and
//! differ only in path and query parameter name.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::{
    error::Outcome,
    model::SourceQuote,
    provider::{ProviderId, RateProvider, http::get_json},
};

#[derive(Debug, Clone)]
pub struct BaseRatesProvider {
    id: ProviderId,
    http: Client,
    base_url: String,
    path: &'static str,
    base_param: &'static str,
}

impl BaseRatesProvider {
    pub fn new(
        id: ProviderId,
        http: Client,
        base_url: String,
        path: &'static str,
        base_param: &'static str,
    ) -> Self {
        Self { id, http, base_url, path, base_param }
    }

    pub fn frankfurter(http: Client, base_url: String) -> Self {
        Self::new(ProviderId::Frankfurter, http, base_url, "/latest", "from")
    }

    pub fn exchangerate_host(http: Client, base_url: String) -> Self {
        Self::new(ProviderId::ExchangerateHost, http, base_url, "/latest", "base")
    }

    pub fn vatcomply(http: Client, base_url: String) -> Self {
        Self::new(ProviderId::VatComply, http, base_url, "/rates", "base")
    }
}

#[derive(Debug, Deserialize)]
struct BaseRatesResponse {
    rates: BTreeMap<String, f64>,
}

#[async_trait]
impl RateProvider for BaseRatesProvider {
    fn name(&self) -> &str {
        self.id.display_name()
    }

    async fn fetch_rates(&self, base: &str) -> Outcome<SourceQuote> {
        let url = format!("{}{}", self.base_url, self.path);
        let request = self.http.get(url).query(&[(self.base_param, base)]);

        let parsed: BaseRatesResponse = get_json(self.name(), request).await?;

        let values = parsed
            .rates
            .into_iter()
            .map(|(currency, rate)| (currency.to_uppercase(), rate))
            .collect();

        Ok(SourceQuote::new(self.name(), values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    #[tokio::test]
    async fn frankfurter_sends_base_as_from_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("from", "USD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "amount": 1.0,
                "base": "USD",
                "date": "2024-05-01",
                "rates": { "EUR": 0.93, "gbp": 0.8 }
            })))
            .mount(&server)
            .await;

        let provider = BaseRatesProvider::frankfurter(Client::new(), server.uri());
        let quote = provider.fetch_rates("USD").await.unwrap();

        assert_eq!(quote.source, "Frankfurter");
        assert_eq!(quote.values.get("EUR"), Some(&0.93));
        assert_eq!(quote.values.get("GBP"), Some(&0.8));
    }

    #[tokio::test]
    async fn vatcomply_uses_rates_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates"))
            .and(query_param("base", "EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "base": "EUR",
                "date": "2024-05-01",
                "rates": { "USD": 1.07 }
            })))
            .mount(&server)
            .await;

        let provider = BaseRatesProvider::vatcomply(Client::new(), server.uri());
        let quote = provider.fetch_rates("EUR").await.unwrap();

        assert_eq!(quote.source, "VATComply");
        assert_eq!(quote.values.len(), 1);
    }

    #[tokio::test]
    async fn non_success_status_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let provider = BaseRatesProvider::frankfurter(Client::new(), server.uri());
        let err = provider.fetch_rates("XXX").await.unwrap_err();

        assert_eq!(
            err,
            ProviderError::HttpStatus {
                provider: "Frankfurter".into(),
                status: 404,
                body: "not found".into()
            }
        );
    }

    #[tokio::test]
    async fn body_without_rates_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": { "code": 101, "type": "missing_access_key" }
            })))
            .mount(&server)
            .await;

        let provider = BaseRatesProvider::exchangerate_host(Client::new(), server.uri());
        let err = provider.fetch_rates("USD").await.unwrap_err();

        assert!(matches!(err, ProviderError::Malformed { .. }));
        assert_eq!(err.provider(), "Exchangerate.host");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_failure() {
        let provider =
            BaseRatesProvider::frankfurter(Client::new(), "http://127.0.0.1:1".to_string());
        let err = provider.fetch_rates("USD").await.unwrap_err();

        assert!(matches!(err, ProviderError::Transport { .. }));
    }
}
