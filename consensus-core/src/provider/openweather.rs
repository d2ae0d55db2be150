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

/// The free forecast endpoint returns 3-hour slots; only the first few are kept.
const FORECAST_ENTRIES: usize = 5;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherProvider {
    pub fn new(http: Client, base_url: String, api_key: Option<String>) -> Self {
        Self { http, base_url, api_key }
    }

    fn api_key(&self) -> Outcome<&str> {
        require_key(self.name(), self.api_key.as_deref(), "OPENWEATHER_API_KEY")
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

fn first_description(weather: &[OwWeather]) -> String {
    weather.first().map(|w| w.description.clone()).unwrap_or_else(|| "Unknown".to_string())
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn name(&self) -> &str {
        ProviderId::OpenWeather.display_name()
    }

    async fn current(&self, city: &str) -> Outcome<WeatherReading> {
        let api_key = self.api_key()?;

        let request = self.http.get(format!("{}/weather", self.base_url)).query(&[
            ("q", city),
            ("appid", api_key),
            ("units", "metric"),
        ]);

        let parsed: OwCurrentResponse = get_json(self.name(), request).await?;

        Ok(WeatherReading {
            city: parsed.name,
            temperature: parsed.main.temp,
            humidity: parsed.main.humidity,
            description: first_description(&parsed.weather),
            wind_speed: parsed.wind.speed,
            source: self.name().to_string(),
        })
    }

    async fn forecast(&self, city: &str) -> Outcome<ForecastResult> {
        let api_key = self.api_key()?;

        let request = self.http.get(format!("{}/forecast", self.base_url)).query(&[
            ("q", city),
            ("appid", api_key),
            ("units", "metric"),
        ]);

        let parsed: OwForecastResponse = get_json(self.name(), request).await?;

        let forecast = parsed
            .list
            .iter()
            .take(FORECAST_ENTRIES)
            .map(|entry| ForecastEntry {
                date: entry.dt_txt.clone(),
                temperature: entry.main.temp,
                description: first_description(&entry.weather),
            })
            .collect();

        Ok(ForecastResult {
            city: parsed.city.name,
            forecast,
            source: self.name().to_string(),
        })
    }
}
