//! Human-readable rendering of merged results.

use std::fmt::Write;

use consensus_core::{
    ConversionResult, ForecastResult, ProviderId, RatesResult, WeatherReading, config::Config,
};

pub fn rates(result: &RatesResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Rates for 1 {} (sources: {})", result.base, result.sources.join(", "));

    if result.exchanges.is_empty() {
        out.push_str("  no rates reported\n");
        return out;
    }

    for exchange in &result.exchanges {
        let _ = writeln!(
            out,
            "  {:<6} {:>16}  [{}]",
            exchange.currency,
            exchange.average_rate,
            exchange.source_names().join(", ")
        );
    }
    out
}

pub fn conversion(result: &ConversionResult) -> String {
    format!(
        "{} {} = {} {} (rate {}, sources: {})\n",
        result.amount,
        result.from,
        result.converted,
        result.to,
        result.rate,
        result.sources.join(", ")
    )
}

pub fn weather(reading: &WeatherReading) -> String {
    format!(
        "Weather in {}\n  {}\n  Temperature: {}°C\n  Humidity:    {}%\n  Wind:        {} m/s\n  Source:      {}\n",
        reading.city,
        reading.description,
        reading.temperature,
        reading.humidity,
        reading.wind_speed,
        reading.source
    )
}

pub fn forecast(result: &ForecastResult) -> String {
    let mut out = format!("Forecast for {} ({})\n", result.city, result.source);
    for entry in &result.forecast {
        let _ = writeln!(out, "  {:<20} {:>6}°C  {}", entry.date, entry.temperature, entry.description);
    }
    out
}

/// Provider roster with credential status.
pub fn providers(config: &Config) -> String {
    let mut out = String::new();
    for id in ProviderId::all() {
        let status = match id.credential_env() {
            None => "no key needed".to_string(),
            Some(_) if config.is_provider_configured(*id) => "configured".to_string(),
            Some(env) => format!("missing key (set {env} or run `consensus configure {id}`)"),
        };
        let _ = writeln!(
            out,
            "  {:<18} {:<18} {:<8} {status}",
            id.as_str(),
            id.display_name(),
            id.domain().as_str()
        );
    }
    out
}
