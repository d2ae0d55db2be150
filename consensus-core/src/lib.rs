//! Core library for the `consensus` CLI and HTTP service.
//!
//! Every request fans out to all providers of a domain, tolerates partial
//! failure, and merges whatever succeeded:
//! - [`service::RateService`] for forex and crypto rates and conversions
//! - [`service::WeatherService`] for current conditions and forecasts
//!
//! Provider adapters live under [`provider`]; the merge policies in
//! [`aggregate`], [`convert`] and [`forecast`] are pure functions.

pub mod aggregate;
pub mod config;
pub mod convert;
pub mod error;
pub mod fanout;
pub mod forecast;
pub mod model;
pub mod provider;
pub mod service;

pub use config::{Config, ProviderConfig, ServerConfig};
pub use error::{AggregateError, Outcome, ProviderError};
pub use model::{
    ConversionResult, CurrencyRate, Domain, ForecastEntry, ForecastResult, RatesResult,
    SourceQuote, SourceRate, WeatherReading,
};
pub use provider::{ProviderId, RateProvider, WeatherProvider, http_client};
pub use service::{RateService, WeatherService};
