use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::Outcome,
    model::{ForecastEntry, ForecastResult, WeatherReading},
    provider::{
        ProviderId, WeatherProvider,
        http::{get_json, require_key},
    },
};

const FORECAST_DAYS: &str = "5";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherApiProvider {
    pub fn new(http: Client, base_url: String, api_key: Option<String>) -> Self {
        Self { http, base_url, api_key }
    }

    fn api_key(&self) -> Outcome<&str> {
        require_key(self.name(), self.api_key.as_deref(), "WEATHERAPI_KEY")
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    humidity: u8,
    wind_kph: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    avgtemp_c: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: String,
    day: WaDay,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    forecast: WaForecast,
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn name(&self) -> &str {
        ProviderId::WeatherApi.display_name()
    }

    async fn current(&self, city: &str) -> Outcome<WeatherReading> {
        let api_key = self.api_key()?;

        let request = self
            .http
            .get(format!("{}/current.json", self.base_url))
            .query(&[("key", api_key), ("q", city)]);

        let parsed: WaResponse = get_json(self.name(), request).await?;

        Ok(WeatherReading {
            city: parsed.location.name,
            temperature: parsed.current.temp_c,
            humidity: parsed.current.humidity,
            description: parsed.current.condition.text,
            // kph -> m/s, to match OpenWeatherMap's metric units
            wind_speed: parsed.current.wind_kph / 3.6,
            source: self.name().to_string(),
        })
    }

    async fn forecast(&self, city: &str) -> Outcome<ForecastResult> {
        let api_key = self.api_key()?;

        let request = self
            .http
            .get(format!("{}/forecast.json", self.base_url))
            .query(&[("key", api_key), ("q", city), ("days", FORECAST_DAYS)]);

        let parsed: WaForecastResponse = get_json(self.name(), request).await?;

        let forecast = parsed
            .forecast
            .forecastday
            .into_iter()
            .map(|day| ForecastEntry {
                date: day.date,
                temperature: day.day.avgtemp_c,
                description: day.day.condition.text,
            })
            .collect();

        Ok(ForecastResult {
            city: parsed.location.name,
            forecast,
            source: self.name().to_string(),
        })
    }
}
