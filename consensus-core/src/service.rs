//! Request-level entry points: validate, fan out, merge.

use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    Config,
    aggregate::{merge_rates, merge_weather},
    convert,
    error::{AggregateError, ProviderError},
    fanout::{collect_successes, fan_out},
    forecast::align_forecasts,
    model::{ConversionResult, Domain, ForecastResult, RatesResult, WeatherReading},
    provider::{self, RateProvider, WeatherProvider},
};

/// Uppercase, trimmed currency code. Only ASCII alphanumerics are accepted
/// because codes end up in provider URL paths.
pub fn normalize_code(label: &str, code: &str) -> Result<String, AggregateError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AggregateError::validation(format!("{label} parameter is required")));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AggregateError::validation(format!("{label} '{code}' is not a valid code")));
    }
    Ok(code.to_ascii_uppercase())
}

/// City names are passed to providers as given; only blank input is rejected.
pub fn validate_city(city: &str) -> Result<&str, AggregateError> {
    if city.trim().is_empty() {
        return Err(AggregateError::validation("City parameter is required"));
    }
    Ok(city)
}

/// Fan-out and rate-merge for one rate domain (forex or crypto).
#[derive(Debug, Clone)]
pub struct RateService {
    domain: Domain,
    providers: Vec<Arc<dyn RateProvider>>,
}

impl RateService {
    pub fn new(domain: Domain, providers: Vec<Arc<dyn RateProvider>>) -> Self {
        Self { domain, providers }
    }

    pub fn forex(config: &Config, http: &Client) -> Self {
        Self::new(Domain::Forex, provider::forex_providers(config, http))
    }

    pub fn crypto(config: &Config, http: &Client) -> Self {
        Self::new(Domain::Crypto, provider::crypto_providers(config, http))
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Merged rates for `base` across every provider that answered.
    #[instrument(skip(self), fields(domain = %self.domain))]
    pub async fn get_rates(&self, base: &str) -> Result<RatesResult, AggregateError> {
        let label = match self.domain {
            Domain::Crypto => "Base cryptocurrency",
            _ => "Base currency",
        };
        let base = normalize_code(label, base)?;

        let key = base.as_str();
        let outcomes = fan_out(&self.providers, |p| async move {
            // A quote with no rates is useless for merging.
            let quote = p.fetch_rates(key).await?;
            if quote.values.is_empty() {
                return Err(ProviderError::no_data(p.name(), key));
            }
            Ok(quote)
        })
        .await;

        let quotes = collect_successes(self.domain, &base, outcomes)?;
        let result = merge_rates(&base, &quotes);

        debug!(currencies = result.exchanges.len(), sources = ?result.sources, "rates merged");
        Ok(result)
    }

    /// Convert `amount` of `from` into `to` using freshly merged rates.
    #[instrument(skip(self), fields(domain = %self.domain))]
    pub async fn convert(
        &self,
        from: &str,
        to: &str,
        amount: f64,
    ) -> Result<ConversionResult, AggregateError> {
        let from = normalize_code("From currency", from)?;
        let to = normalize_code("To currency", to)?;
        if !amount.is_finite() {
            return Err(AggregateError::validation("Amount must be a valid number"));
        }

        let rates = self.get_rates(&from).await?;
        convert::convert(self.domain, &rates, &to, amount)
    }
}

/// Fan-out and merge for current weather and forecasts.
#[derive(Debug, Clone)]
pub struct WeatherService {
    providers: Vec<Arc<dyn WeatherProvider>>,
}

impl WeatherService {
    pub fn new(providers: Vec<Arc<dyn WeatherProvider>>) -> Self {
        Self { providers }
    }

    pub fn from_config(config: &Config, http: &Client) -> Self {
        Self::new(provider::weather_providers(config, http))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    #[instrument(skip(self))]
    pub async fn current(&self, city: &str) -> Result<WeatherReading, AggregateError> {
        let city = validate_city(city)?;

        let outcomes = fan_out(&self.providers, |p| p.current(city)).await;
        let readings = collect_successes(Domain::Weather, city, outcomes)?;

        merge_weather(&readings).ok_or_else(|| unavailable(Domain::Weather, city))
    }

    #[instrument(skip(self))]
    pub async fn forecast(&self, city: &str) -> Result<ForecastResult, AggregateError> {
        let city = validate_city(city)?;

        let outcomes = fan_out(&self.providers, |p| p.forecast(city)).await;
        let series = collect_successes(Domain::Forecast, city, outcomes)?;

        align_forecasts(&series).ok_or_else(|| unavailable(Domain::Forecast, city))
    }
}

fn unavailable(domain: Domain, key: &str) -> AggregateError {
    AggregateError::AggregateUnavailable { domain, key: key.to_string(), failures: Vec::new() }
}
