//! HTTP surface: one axum router over the rate and weather services.
//!
//! Every domain failure is answered with `400` and a `{ code, message }` body.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use consensus_core::{
    AggregateError, ConversionResult, ForecastResult, RateService, RatesResult, WeatherReading,
    WeatherService,
};

pub struct AppState {
    pub forex: RateService,
    pub crypto: RateService,
    pub weather: WeatherService,
}

pub type SharedState = Arc<AppState>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/forex/rates", get(forex_rates))
        .route("/v1/forex/convert", get(forex_convert))
        .route("/v1/crypto/rates", get(crypto_rates))
        .route("/v1/crypto/convert", get(crypto_convert))
        .route("/v1/weather", get(current_weather))
        .route("/v1/weather/forecast", get(weather_forecast))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: SharedState, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    info!(addr = %bind, "consensus server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl+C; shutting down");
        return;
    }
    info!("received Ctrl+C, shutting down");
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

pub struct ApiError(AggregateError);

impl From<AggregateError> for ApiError {
    fn from(err: AggregateError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { code: self.0.code(), message: self.0.to_string() };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
struct RatesQuery {
    base: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConvertQuery {
    from: Option<String>,
    to: Option<String>,
    amount: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CityQuery {
    city: Option<String>,
}

/// Missing parameters and unparsable amounts are rejected here, before any
/// provider is contacted.
fn conversion_params(query: ConvertQuery) -> Result<(String, String, f64), AggregateError> {
    let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(from), Some(to), Some(amount)) =
        (present(query.from), present(query.to), present(query.amount))
    else {
        return Err(AggregateError::validation("from, to, and amount parameters are required"));
    };

    let amount = amount
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite())
        .ok_or_else(|| AggregateError::validation("Amount must be a valid number"))?;

    Ok((from, to, amount))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn rates(service: &RateService, query: RatesQuery) -> ApiResult<RatesResult> {
    let base = query.base.unwrap_or_default();
    Ok(Json(service.get_rates(&base).await?))
}

async fn convert(service: &RateService, query: ConvertQuery) -> ApiResult<ConversionResult> {
    let (from, to, amount) = conversion_params(query)?;
    Ok(Json(service.convert(&from, &to, amount).await?))
}

async fn forex_rates(
    State(state): State<SharedState>,
    Query(query): Query<RatesQuery>,
) -> ApiResult<RatesResult> {
    rates(&state.forex, query).await
}

async fn forex_convert(
    State(state): State<SharedState>,
    Query(query): Query<ConvertQuery>,
) -> ApiResult<ConversionResult> {
    convert(&state.forex, query).await
}

async fn crypto_rates(
    State(state): State<SharedState>,
    Query(query): Query<RatesQuery>,
) -> ApiResult<RatesResult> {
    rates(&state.crypto, query).await
}

async fn crypto_convert(
    State(state): State<SharedState>,
    Query(query): Query<ConvertQuery>,
) -> ApiResult<ConversionResult> {
    convert(&state.crypto, query).await
}

async fn current_weather(
    State(state): State<SharedState>,
    Query(query): Query<CityQuery>,
) -> ApiResult<WeatherReading> {
    let city = query.city.unwrap_or_default();
    Ok(Json(state.weather.current(&city).await?))
}

async fn weather_forecast(
    State(state): State<SharedState>,
    Query(query): Query<CityQuery>,
) -> ApiResult<ForecastResult> {
    let city = query.city.unwrap_or_default();
    Ok(Json(state.weather.forecast(&city).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::Request,
    };
    use consensus_core::{
        Domain, ForecastEntry, Outcome, ProviderError, RateProvider, SourceQuote, WeatherProvider,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    #[derive(Debug)]
    struct StubRates {
        name: &'static str,
        usd: Option<f64>,
    }

    #[async_trait]
    impl RateProvider for StubRates {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_rates(&self, base: &str) -> Outcome<SourceQuote> {
            let usd = self.usd.ok_or_else(|| ProviderError::HttpStatus {
                provider: self.name.to_string(),
                status: 503,
                body: format!("no rates for {base}"),
            })?;
            Ok(SourceQuote::new(self.name, [("USD".to_string(), usd)].into_iter().collect()))
        }
    }

    #[derive(Debug)]
    struct StubWeather(&'static str, f64);

    #[async_trait]
    impl WeatherProvider for StubWeather {
        fn name(&self) -> &str {
            self.0
        }

        async fn current(&self, city: &str) -> Outcome<WeatherReading> {
            Ok(WeatherReading {
                city: city.to_string(),
                temperature: self.1,
                humidity: 40,
                description: "Clear".into(),
                wind_speed: 2.0,
                source: self.0.to_string(),
            })
        }

        async fn forecast(&self, city: &str) -> Outcome<ForecastResult> {
            Ok(ForecastResult {
                city: city.to_string(),
                forecast: vec![ForecastEntry {
                    date: "2024-05-01".into(),
                    temperature: self.1,
                    description: "Clear".into(),
                }],
                source: self.0.to_string(),
            })
        }
    }

    fn app() -> Router {
        let state = AppState {
            forex: RateService::new(
                Domain::Forex,
                vec![
                    Arc::new(StubRates { name: "A", usd: Some(2.0) }),
                    Arc::new(StubRates { name: "B", usd: Some(3.0) }),
                    Arc::new(StubRates { name: "Down", usd: None }),
                ],
            ),
            crypto: RateService::new(
                Domain::Crypto,
                vec![Arc::new(StubRates { name: "Down", usd: None })],
            ),
            weather: WeatherService::new(vec![
                Arc::new(StubWeather("A", 20.0)),
                Arc::new(StubWeather("B", 22.0)),
            ]),
        };
        router(Arc::new(state))
    }

    async fn request(uri: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = request("/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn forex_rates_use_camel_case_shape() {
        let (status, body) = request("/v1/forex/rates?base=eur").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "base": "EUR",
                "exchanges": [{
                    "currency": "USD",
                    "rates": [
                        { "source": "A", "rate": 2.0 },
                        { "source": "B", "rate": 3.0 }
                    ],
                    "averageRate": 2.5
                }],
                "sources": ["A", "B"]
            })
        );
    }

    #[tokio::test]
    async fn missing_base_is_bad_request() {
        let (status, body) = request("/v1/forex/rates").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
        assert_eq!(body["message"], "Base currency parameter is required");
    }

    #[tokio::test]
    async fn forex_convert_returns_rounded_amount() {
        let (status, body) = request("/v1/forex/convert?from=eur&to=usd&amount=10").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["from"], "EUR");
        assert_eq!(body["to"], "USD");
        assert_eq!(body["converted"], 25.0);
        assert_eq!(body["rate"], 2.5);
        assert_eq!(body["sources"], json!(["A", "B"]));
    }

    #[tokio::test]
    async fn convert_validates_parameters() {
        let (status, body) = request("/v1/forex/convert?from=EUR&to=USD").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "from, to, and amount parameters are required");

        let (status, body) = request("/v1/forex/convert?from=EUR&to=USD&amount=ten").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Amount must be a valid number");
    }

    #[tokio::test]
    async fn convert_to_unquoted_currency_is_bad_request() {
        let (status, body) = request("/v1/forex/convert?from=EUR&to=JPY&amount=1").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "CONVERSION_UNAVAILABLE");
        assert_eq!(body["message"], "Rate not available for EUR to JPY");
    }

    #[tokio::test]
    async fn all_crypto_providers_down_is_bad_request() {
        let (status, body) = request("/v1/crypto/rates?base=BTC").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "AGGREGATE_UNAVAILABLE");
        assert_eq!(body["message"], "Failed to fetch cryptocurrency rates for base: BTC");
    }

    #[tokio::test]
    async fn weather_is_merged() {
        let (status, body) = request("/v1/weather?city=Lisbon").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["city"], "Lisbon");
        assert_eq!(body["temperature"], 21.0);
        assert_eq!(body["windSpeed"], 2.0);
        assert_eq!(body["source"], "Aggregated (A, B)");
    }

    #[tokio::test]
    async fn forecast_requires_city() {
        let (status, body) = request("/v1/weather/forecast").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "City parameter is required");

        let (status, body) = request("/v1/weather/forecast?city=Oslo").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["forecast"][0]["temperature"], 21.0);
    }
}
