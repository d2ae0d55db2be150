use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::Password;
use serde::Serialize;

use consensus_core::{Config, ProviderId, RateService, WeatherService, http_client};

use crate::{output, server};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "consensus", version, about = "Multi-source rates and weather")]
pub struct Cli {
    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Market {
    Forex,
    Crypto,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store an API key for a provider in the config file.
    Configure {
        /// Provider short name, e.g. "openweather" or "exchangerate-api".
        provider: String,
    },

    /// Show merged rates for one unit of a base currency.
    Rates {
        base: String,

        #[arg(long, value_enum, default_value = "forex")]
        market: Market,
    },

    /// Convert an amount between two currencies.
    Convert {
        from: String,
        to: String,
        amount: f64,

        #[arg(long, value_enum, default_value = "forex")]
        market: Market,
    },

    /// Show merged current weather for a city.
    Weather { city: String },

    /// Show the merged multi-day forecast for a city.
    Forecast { city: String },

    /// List known providers and whether they have credentials.
    Providers,

    /// Run the HTTP API.
    Serve {
        /// Listen address; defaults to `server.bind` from the config file.
        #[arg(long)]
        bind: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        self.run_with(Config::load).await
    }

    /// `configure` works on the config file directly and never goes through
    /// `load`, so a broken file can still be rewritten.
    async fn run_with<L>(self, load: L) -> Result<()>
    where
        L: FnOnce() -> Result<Config>,
    {
        let json = self.json;

        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Rates { base, market } => {
                let config = load()?;
                let result = rate_service(&config, market)?.get_rates(&base).await?;
                print(json, &result, output::rates)
            }
            Command::Convert { from, to, amount, market } => {
                let config = load()?;
                let result = rate_service(&config, market)?.convert(&from, &to, amount).await?;
                print(json, &result, output::conversion)
            }
            Command::Weather { city } => {
                let config = load()?;
                let result = weather_service(&config)?.current(&city).await?;
                print(json, &result, output::weather)
            }
            Command::Forecast { city } => {
                let config = load()?;
                let result = weather_service(&config)?.forecast(&city).await?;
                print(json, &result, output::forecast)
            }
            Command::Providers => {
                print!("{}", output::providers(&load()?));
                Ok(())
            }
            Command::Serve { bind } => {
                let config = load()?;
                let http = http_client(&config)?;
                let state = server::AppState {
                    forex: RateService::forex(&config, &http),
                    crypto: RateService::crypto(&config, &http),
                    weather: WeatherService::from_config(&config, &http),
                };
                let bind = bind.unwrap_or_else(|| config.server.bind.clone());
                server::serve(Arc::new(state), &bind).await
            }
        }
    }
}

fn rate_service(config: &Config, market: Market) -> Result<RateService> {
    let http = http_client(config)?;
    Ok(match market {
        Market::Forex => RateService::forex(config, &http),
        Market::Crypto => RateService::crypto(config, &http),
    })
}

fn weather_service(config: &Config) -> Result<WeatherService> {
    let http = http_client(config)?;
    Ok(WeatherService::from_config(config, &http))
}

fn print<T: Serialize>(json: bool, value: &T, render: fn(&T) -> String) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
        println!("{text}");
    } else {
        print!("{}", render(value));
    }
    Ok(())
}

/// Prompt for an API key and write it to the config file.
///
/// Only the file is read and written here so that keys coming from the
/// environment are never persisted.
fn configure(provider: &str) -> Result<()> {
    let id = ProviderId::try_from(provider)?;
    let Some(env_var) = id.credential_env() else {
        bail!("{} does not need an API key", id.display_name());
    };

    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    let api_key = Password::new(&format!("{} API key:", id.display_name()))
        .without_confirmation()
        .with_help_message(&format!("Stored in {}; {env_var} overrides it", path.display()))
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key cannot be empty");
    }

    config.upsert_provider_api_key(id, api_key.to_string());
    config.save_to(&path)?;

    println!("Saved {} credentials to {}", id.display_name(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rates_with_market() {
        let cli = Cli::try_parse_from(["consensus", "rates", "btc", "--market", "crypto"]).unwrap();

        match cli.command {
            Command::Rates { base, market } => {
                assert_eq!(base, "btc");
                assert_eq!(market, Market::Crypto);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn market_defaults_to_forex() {
        let cli = Cli::try_parse_from(["consensus", "convert", "EUR", "USD", "12.5"]).unwrap();

        match cli.command {
            Command::Convert { from, to, amount, market } => {
                assert_eq!((from.as_str(), to.as_str()), ("EUR", "USD"));
                assert_eq!(amount, 12.5);
                assert_eq!(market, Market::Forex);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::try_parse_from(["consensus", "weather", "Lisbon", "--json"]).unwrap();

        assert!(cli.json);
        assert!(matches!(cli.command, Command::Weather { ref city } if city == "Lisbon"));
    }

    #[test]
    fn non_numeric_amount_is_rejected() {
        assert!(Cli::try_parse_from(["consensus", "convert", "EUR", "USD", "ten"]).is_err());
    }

    #[test]
    fn serve_accepts_bind_override() {
        let cli = Cli::try_parse_from(["consensus", "serve", "--bind", "0.0.0.0:8080"]).unwrap();

        assert!(matches!(cli.command, Command::Serve { bind: Some(ref b) } if b == "0.0.0.0:8080"));
    }

    #[test]
    fn keyless_provider_cannot_be_configured() {
        let err = configure("frankfurter").unwrap_err();

        assert_eq!(err.to_string(), "Frankfurter does not need an API key");
    }

    #[tokio::test]
    async fn configure_does_not_load_config() {
        let cli = Cli::try_parse_from(["consensus", "configure", "frankfurter"]).unwrap();

        let err = cli
            .run_with(|| anyhow::bail!("Failed to parse config file: config.toml"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Frankfurter does not need an API key");
    }

    #[tokio::test]
    async fn other_commands_surface_config_errors() {
        let cli = Cli::try_parse_from(["consensus", "providers"]).unwrap();

        let err = cli
            .run_with(|| anyhow::bail!("Failed to parse config file: config.toml"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to parse config file: config.toml");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = configure("nope").unwrap_err();

        assert!(err.to_string().contains("Unknown provider 'nope'"));
    }
}
