use crate::{
    Config,
    error::Outcome,
    model::{Domain, ForecastResult, SourceQuote, WeatherReading},
    provider::{
        base_rates::BaseRatesProvider, coincap::CoinCapProvider, coingecko::CoinGeckoProvider,
        coinpaprika::CoinpaprikaProvider, cryptocompare::CryptoCompareProvider,
        currency_api::CurrencyApiProvider, exchangerate_api::ExchangeRateApiProvider,
        openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider,
    },
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

pub mod base_rates;
pub mod coincap;
pub mod coingecko;
pub mod coinpaprika;
pub mod cryptocompare;
pub mod currency_api;
pub mod exchangerate_api;
mod http;
pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Frankfurter,
    ExchangeRateApi,
    CurrencyApi,
    ExchangerateHost,
    VatComply,
    CoinGecko,
    Coinpaprika,
    CryptoCompare,
    CoinCap,
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    /// Config-file key, e.g. `[providers.openweather]`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Frankfurter => "frankfurter",
            ProviderId::ExchangeRateApi => "exchangerate-api",
            ProviderId::CurrencyApi => "currency-api",
            ProviderId::ExchangerateHost => "exchangerate-host",
            ProviderId::VatComply => "vatcomply",
            ProviderId::CoinGecko => "coingecko",
            ProviderId::Coinpaprika => "coinpaprika",
            ProviderId::CryptoCompare => "cryptocompare",
            ProviderId::CoinCap => "coincap",
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    /// Source label attached to quotes and shown to users.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::Frankfurter => "Frankfurter",
            ProviderId::ExchangeRateApi => "ExchangeRate-API",
            ProviderId::CurrencyApi => "Currency-api",
            ProviderId::ExchangerateHost => "Exchangerate.host",
            ProviderId::VatComply => "VATComply",
            ProviderId::CoinGecko => "CoinGecko",
            ProviderId::Coinpaprika => "Coinpaprika",
            ProviderId::CryptoCompare => "CryptoCompare",
            ProviderId::CoinCap => "CoinCap",
            ProviderId::OpenWeather => "OpenWeatherMap",
            ProviderId::WeatherApi => "WeatherAPI",
        }
    }

    /// Weather providers serve both current readings and forecasts.
    pub fn domain(&self) -> Domain {
        match self {
            ProviderId::Frankfurter
            | ProviderId::ExchangeRateApi
            | ProviderId::CurrencyApi
            | ProviderId::ExchangerateHost
            | ProviderId::VatComply => Domain::Forex,
            ProviderId::CoinGecko
            | ProviderId::Coinpaprika
            | ProviderId::CryptoCompare
            | ProviderId::CoinCap => Domain::Crypto,
            ProviderId::OpenWeather | ProviderId::WeatherApi => Domain::Weather,
        }
    }

    /// Environment variable holding the provider's credential, if it needs one.
    pub fn credential_env(&self) -> Option<&'static str> {
        match self {
            ProviderId::ExchangeRateApi => Some("EXCHANGERATE_API_KEY"),
            ProviderId::OpenWeather => Some("OPENWEATHER_API_KEY"),
            ProviderId::WeatherApi => Some("WEATHERAPI_KEY"),
            _ => None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::Frankfurter => "https://api.frankfurter.app",
            ProviderId::ExchangeRateApi => "https://v6.exchangerate-api.com/v6",
            ProviderId::CurrencyApi => {
                "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest/v1/currencies"
            }
            ProviderId::ExchangerateHost => "https://api.exchangerate.host",
            ProviderId::VatComply => "https://api.vatcomply.com",
            ProviderId::CoinGecko => "https://api.coingecko.com/api/v3",
            ProviderId::Coinpaprika => "https://api.coinpaprika.com/v1",
            ProviderId::CryptoCompare => "https://min-api.cryptocompare.com/data",
            ProviderId::CoinCap => "https://api.coincap.io/v2",
            ProviderId::OpenWeather => "https://api.openweathermap.org/data/2.5",
            ProviderId::WeatherApi => "https://api.weatherapi.com/v1",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[
            ProviderId::Frankfurter,
            ProviderId::ExchangeRateApi,
            ProviderId::CurrencyApi,
            ProviderId::ExchangerateHost,
            ProviderId::VatComply,
            ProviderId::CoinGecko,
            ProviderId::Coinpaprika,
            ProviderId::CryptoCompare,
            ProviderId::CoinCap,
            ProviderId::OpenWeather,
            ProviderId::WeatherApi,
        ]
    }

    /// Providers serving `domain`, in fan-out order.
    pub fn for_domain(domain: Domain) -> Vec<ProviderId> {
        let domain = match domain {
            Domain::Forecast => Domain::Weather,
            other => other,
        };
        Self::all().iter().copied().filter(|id| id.domain() == domain).collect()
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        ProviderId::all().iter().copied().find(|id| id.as_str() == lower).ok_or_else(|| {
            let supported: Vec<&str> = ProviderId::all().iter().map(|id| id.as_str()).collect();
            anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: {}.",
                supported.join(", ")
            )
        })
    }
}

/// One upstream source of currency or cryptocurrency rates.
///
/// Implementations never return a transport error to the caller: every failure
/// becomes the `Err` arm of the [`Outcome`].
#[async_trait]
pub trait RateProvider: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Rates for 1 unit of `base`, keyed by uppercase currency code.
    async fn fetch_rates(&self, base: &str) -> Outcome<SourceQuote>;
}

/// One upstream source of weather data.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn name(&self) -> &str;

    async fn current(&self, city: &str) -> Outcome<WeatherReading>;

    async fn forecast(&self, city: &str) -> Outcome<ForecastResult>;
}

/// Shared HTTP client; the configured timeout is the only per-call bound.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .user_agent(concat!("consensus/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Construct the forex roster from config.
pub fn forex_providers(config: &Config, http: &Client) -> Vec<Arc<dyn RateProvider>> {
    vec![
        Arc::new(BaseRatesProvider::frankfurter(http.clone(), config.base_url(ProviderId::Frankfurter))),
        Arc::new(ExchangeRateApiProvider::new(
            http.clone(),
            config.base_url(ProviderId::ExchangeRateApi),
            config.provider_api_key(ProviderId::ExchangeRateApi).map(str::to_owned),
        )),
        Arc::new(CurrencyApiProvider::new(http.clone(), config.base_url(ProviderId::CurrencyApi))),
        Arc::new(BaseRatesProvider::exchangerate_host(
            http.clone(),
            config.base_url(ProviderId::ExchangerateHost),
        )),
        Arc::new(BaseRatesProvider::vatcomply(http.clone(), config.base_url(ProviderId::VatComply))),
    ]
}

/// Construct the cryptocurrency roster from config.
pub fn crypto_providers(config: &Config, http: &Client) -> Vec<Arc<dyn RateProvider>> {
    let quotes = |id: ProviderId| config.quote_currencies(id).map(<[String]>::to_vec);

    let mut coingecko = CoinGeckoProvider::new(http.clone(), config.base_url(ProviderId::CoinGecko));
    if let Some(symbols) = config.symbols(ProviderId::CoinGecko) {
        coingecko = coingecko.with_symbols(symbols.clone());
    }
    if let Some(vs) = quotes(ProviderId::CoinGecko) {
        coingecko = coingecko.with_quote_currencies(vs);
    }

    let mut coinpaprika =
        CoinpaprikaProvider::new(http.clone(), config.base_url(ProviderId::Coinpaprika));
    if let Some(q) = quotes(ProviderId::Coinpaprika) {
        coinpaprika = coinpaprika.with_quote_currencies(q);
    }

    let mut cryptocompare =
        CryptoCompareProvider::new(http.clone(), config.base_url(ProviderId::CryptoCompare));
    if let Some(q) = quotes(ProviderId::CryptoCompare) {
        cryptocompare = cryptocompare.with_quote_currencies(q);
    }

    let mut coincap = CoinCapProvider::new(http.clone(), config.base_url(ProviderId::CoinCap));
    if let Some(q) = quotes(ProviderId::CoinCap) {
        coincap = coincap.with_quote_currencies(q);
    }

    vec![Arc::new(coingecko), Arc::new(coinpaprika), Arc::new(cryptocompare), Arc::new(coincap)]
}

/// Construct the weather roster from config. Providers without an API key are
/// still constructed and report the missing credential as their own failure.
pub fn weather_providers(config: &Config, http: &Client) -> Vec<Arc<dyn WeatherProvider>> {
    vec![
        Arc::new(OpenWeatherProvider::new(
            http.clone(),
            config.base_url(ProviderId::OpenWeather),
            config.provider_api_key(ProviderId::OpenWeather).map(str::to_owned),
        )),
        Arc::new(WeatherApiProvider::new(
            http.clone(),
            config.base_url(ProviderId::WeatherApi),
            config.provider_api_key(ProviderId::WeatherApi).map(str::to_owned),
        )),
    ]
}

/// Quote of `base` in USD plus its cross rate against every other quote
/// currency that has a positive USD price. Used by ticker-list providers that
/// only publish USD prices.
pub(crate) fn usd_cross_rates<F>(
    base: &str,
    base_usd: f64,
    quote_currencies: &[String],
    usd_price: F,
) -> BTreeMap<String, f64>
where
    F: Fn(&str) -> Option<f64>,
{
    let mut values = BTreeMap::from([("USD".to_string(), base_usd)]);

    for symbol in quote_currencies {
        if symbol.eq_ignore_ascii_case(base) {
            continue;
        }
        if let Some(price) = usd_price(symbol).filter(|p| *p > 0.0) {
            values.insert(symbol.to_uppercase(), base_usd / price);
        }
    }

    values
}
