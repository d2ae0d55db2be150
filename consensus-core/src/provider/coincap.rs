use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Outcome, ProviderError},
    model::SourceQuote,
    provider::{ProviderId, RateProvider, http::get_json, usd_cross_rates},
};

const ASSET_LIMIT: &str = "200";

const DEFAULT_QUOTE_CURRENCIES: &[&str] = &[
    "BTC", "ETH", "BNB", "SOL", "XRP", "USDC", "ADA", "DOGE", "TRX", "LINK", "DOT", "MATIC", "LTC",
    "UNI", "XLM", "ATOM", "AVAX", "SHIB", "DAI",
];

/// CoinCap asset list. Prices are USD strings; cross rates are derived.
#[derive(Debug, Clone)]
pub struct CoinCapProvider {
    http: Client,
    base_url: String,
    quote_currencies: Vec<String>,
}

impl CoinCapProvider {
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

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CcAsset {
    symbol: String,
    price_usd: Option<String>,
}

impl CcAsset {
    fn usd_price(&self) -> Option<f64> {
        self.price_usd.as_deref()?.parse().ok()
    }
}

#[derive(Debug, Deserialize)]
struct CcAssetsResponse {
    data: Vec<CcAsset>,
}

#[async_trait]
impl RateProvider for CoinCapProvider {
    fn name(&self) -> &str {
        ProviderId::CoinCap.display_name()
    }

    async fn fetch_rates(&self, base: &str) -> Outcome<SourceQuote> {
        let request = self
            .http
            .get(format!("{}/assets", self.base_url))
            .query(&[("limit", ASSET_LIMIT)]);

        let parsed: CcAssetsResponse = get_json(self.name(), request).await?;

        let asset = parsed
            .data
            .iter()
            .find(|a| a.symbol.eq_ignore_ascii_case(base))
            .ok_or_else(|| ProviderError::no_data(self.name(), base))?;

        let base_usd = asset.usd_price().filter(|p| p.is_finite() && *p > 0.0).ok_or_else(|| {
            ProviderError::malformed(self.name(), format!("unparseable priceUsd for {base}"))
        })?;

        let values = usd_cross_rates(base, base_usd, &self.quote_currencies, |symbol| {
            parsed.data.iter().find(|a| a.symbol == symbol).and_then(CcAsset::usd_price)
        });

        Ok(SourceQuote::new(self.name(), values))
    }
}
