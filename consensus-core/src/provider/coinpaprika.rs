use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Outcome, ProviderError},
    model::SourceQuote,
    provider::{ProviderId, RateProvider, http::get_json, usd_cross_rates},
};

const DEFAULT_QUOTE_CURRENCIES: &[&str] = &["BTC", "ETH", "BNB", "SOL", "XRP", "ADA", "DOGE"];

/// Coinpaprika ticker list. Only USD prices are published, so crypto-to-crypto
/// rates are derived from them.
#[derive(Debug, Clone)]
pub struct CoinpaprikaProvider {
    http: Client,
    base_url: String,
    quote_currencies: Vec<String>,
}

impl CoinpaprikaProvider {
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
struct CpUsdQuote {
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CpQuotes {
    #[serde(rename = "USD")]
    usd: Option<CpUsdQuote>,
}

#[derive(Debug, Deserialize)]
struct CpTicker {
    symbol: String,
    quotes: Option<CpQuotes>,
}

impl CpTicker {
    fn usd_price(&self) -> Option<f64> {
        self.quotes.as_ref()?.usd.as_ref()?.price
    }
}

#[async_trait]
impl RateProvider for CoinpaprikaProvider {
    fn name(&self) -> &str {
        ProviderId::Coinpaprika.display_name()
    }

    async fn fetch_rates(&self, base: &str) -> Outcome<SourceQuote> {
        let url = format!("{}/tickers", self.base_url);
        let tickers: Vec<CpTicker> = get_json(self.name(), self.http.get(url)).await?;

        let base_usd = tickers
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(base))
            .and_then(CpTicker::usd_price)
            .filter(|p| *p > 0.0)
            .ok_or_else(|| ProviderError::no_data(self.name(), base))?;

        let values = usd_cross_rates(base, base_usd, &self.quote_currencies, |symbol| {
            tickers.iter().find(|t| t.symbol == symbol).and_then(CpTicker::usd_price)
        });

        Ok(SourceQuote::new(self.name(), values))
    }
}
