use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Which logical quantity a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Forex,
    Crypto,
    Weather,
    Forecast,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Forex => "forex",
            Domain::Crypto => "crypto",
            Domain::Weather => "weather",
            Domain::Forecast => "forecast",
        }
    }

    /// Phrase used in user-facing failure messages, e.g. "exchange rates for base currency".
    pub fn subject(&self) -> &'static str {
        match self {
            Domain::Forex => "exchange rates for base currency",
            Domain::Crypto => "cryptocurrency rates for base",
            Domain::Weather => "weather data for city",
            Domain::Forecast => "forecast data for city",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provider's normalized reading for a rate domain.
///
/// `values` is keyed by uppercase currency code.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceQuote {
    pub source: String,
    pub values: BTreeMap<String, f64>,
}

impl SourceQuote {
    pub fn new(source: impl Into<String>, values: BTreeMap<String, f64>) -> Self {
        Self { source: source.into(), values }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRate {
    pub source: String,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRate {
    pub currency: String,
    pub rates: Vec<SourceRate>,
    pub average_rate: f64,
}

impl CurrencyRate {
    /// Names of the sources that contributed to this currency, in listing order.
    pub fn source_names(&self) -> Vec<String> {
        self.rates.iter().map(|r| r.source.clone()).collect()
    }
}

/// Merged rates for one base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesResult {
    pub base: String,
    pub exchanges: Vec<CurrencyRate>,
    pub sources: Vec<String>,
}

impl RatesResult {
    pub fn exchange(&self, currency: &str) -> Option<&CurrencyRate> {
        self.exchanges.iter().find(|e| e.currency == currency)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub converted: f64,
    pub rate: f64,
    pub sources: Vec<String>,
}

/// Current conditions, either from one provider or merged across several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    pub city: String,
    pub temperature: f64,
    pub humidity: u8,
    pub description: String,
    /// Metres per second.
    pub wind_speed: f64,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub date: String,
    pub temperature: f64,
    pub description: String,
}

/// Ordered forecast series; index position is the day offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub city: String,
    pub forecast: Vec<ForecastEntry>,
    pub source: String,
}
