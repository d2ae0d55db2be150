use async_trait::async_trait;
use reqwest::Client;
use std::collections::{BTreeMap, HashMap};

use crate::{
    error::{Outcome, ProviderError},
    model::SourceQuote,
    provider::{ProviderId, RateProvider, http::get_json},
};

/// Ticker -> CoinGecko coin id for the assets CoinGecko cannot resolve by symbol.
const DEFAULT_COIN_IDS: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("USDT", "tether"),
    ("BNB", "binancecoin"),
    ("SOL", "solana"),
    ("XRP", "ripple"),
    ("USDC", "usd-coin"),
    ("ADA", "cardano"),
    ("DOGE", "dogecoin"),
    ("TRX", "tron"),
    ("LINK", "chainlink"),
    ("DOT", "polkadot"),
    ("MATIC", "matic-network"),
    ("LTC", "litecoin"),
    ("UNI", "uniswap"),
    ("XLM", "stellar"),
    ("ATOM", "cosmos"),
    ("AVAX", "avalanche-2"),
    ("SHIB", "shiba-inu"),
    ("DAI", "dai"),
    ("AAVE", "aave"),
    ("ALGO", "algorand"),
    ("AXS", "axie-infinity"),
    ("FTM", "fantom"),
    ("MANA", "decentraland"),
    ("SAND", "the-sandbox"),
    ("NEAR", "near"),
    ("VET", "vechain"),
    ("ICP", "internet-computer"),
    ("ETC", "ethereum-classic"),
    ("XMR", "monero"),
    ("EOS", "eos"),
    ("BCH", "bitcoin-cash"),
    ("FIL", "filecoin"),
    ("XTZ", "tezos"),
    ("MKR", "maker"),
    ("CAKE", "pancakeswap-token"),
    ("FLOW", "flow"),
];

const DEFAULT_VS_CURRENCIES: &[&str] = &["USD", "BTC", "ETH"];

/// CoinGecko `simple/price`: price of one coin in a few quote currencies.
#[derive(Debug, Clone)]
pub struct CoinGeckoProvider {
    http: Client,
    base_url: String,
    coin_ids: BTreeMap<String, String>,
    vs_currencies: Vec<String>,
}

impl CoinGeckoProvider {
    pub fn new(http: Client, base_url: String) -> Self {
        Self {
            http,
            base_url,
            coin_ids: default_coin_ids(),
            vs_currencies: DEFAULT_VS_CURRENCIES.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Replace the symbol table. Keys are normalized to uppercase.
    pub fn with_symbols(mut self, symbols: BTreeMap<String, String>) -> Self {
        self.coin_ids = symbols.into_iter().map(|(k, v)| (k.to_uppercase(), v)).collect();
        self
    }

    pub fn with_quote_currencies(mut self, currencies: Vec<String>) -> Self {
        self.vs_currencies = currencies;
        self
    }

    /// Unknown symbols fall back to their lowercase form, which CoinGecko
    /// accepts for many coins.
    fn coin_id(&self, symbol: &str) -> String {
        self.coin_ids
            .get(&symbol.to_uppercase())
            .cloned()
            .unwrap_or_else(|| symbol.to_lowercase())
    }
}

pub fn default_coin_ids() -> BTreeMap<String, String> {
    DEFAULT_COIN_IDS.iter().map(|(sym, id)| (sym.to_string(), id.to_string())).collect()
}

#[async_trait]
impl RateProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        ProviderId::CoinGecko.display_name()
    }

    async fn fetch_rates(&self, base: &str) -> Outcome<SourceQuote> {
        let coin_id = self.coin_id(base);
        let vs = self.vs_currencies.iter().map(|c| c.to_lowercase()).collect::<Vec<_>>().join(",");

        let request = self
            .http
            .get(format!("{}/simple/price", self.base_url))
            .query(&[("ids", coin_id.as_str()), ("vs_currencies", vs.as_str())]);

        let mut parsed: HashMap<String, HashMap<String, f64>> =
            get_json(self.name(), request).await?;

        let prices = parsed.remove(&coin_id).ok_or_else(|| ProviderError::no_data(self.name(), base))?;

        // Zero means "no market", not a price.
        let values: BTreeMap<String, f64> = self
            .vs_currencies
            .iter()
            .filter_map(|c| {
                prices
                    .get(&c.to_lowercase())
                    .copied()
                    .filter(|p| *p != 0.0)
                    .map(|p| (c.to_uppercase(), p))
            })
            .collect();

        Ok(SourceQuote::new(self.name(), values))
    }
}
