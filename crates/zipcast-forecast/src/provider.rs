//! Weather provider: current conditions and daily forecast from Open-Meteo.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::instrument;
use zipcast_core::WeatherConfig;

use crate::error::FetchError;
use crate::location::Location;
use crate::types::{DayForecast, ForecastData, TemperatureUnit, WeatherCondition};

/// Fetches forecasts for resolved locations.
#[async_trait]
pub trait WeatherFetcher: Send + Sync {
    /// Fetch a forecast with a single provider request. No retries.
    async fn fetch(&self, location: &Location) -> Result<ForecastData, FetchError>;
}

/// Countries (and territories) that report temperatures in Fahrenheit.
const FAHRENHEIT_COUNTRIES: &[&str] = &[
    "us", "pr", "gu", "vi", "as", "mp", "um", "bs", "bz", "ky", "pw", "lr", "mm",
];

/// Pick a concrete unit for a location. `Auto` follows local custom.
pub fn resolve_unit(preference: TemperatureUnit, country_code: &str) -> TemperatureUnit {
    match preference {
        TemperatureUnit::Auto => {
            if FAHRENHEIT_COUNTRIES.contains(&country_code.to_ascii_lowercase().as_str()) {
                TemperatureUnit::Fahrenheit
            } else {
                TemperatureUnit::Celsius
            }
        }
        unit => unit,
    }
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current: Option<OpenMeteoCurrent>,
    // Kept raw: daily data is optional and must not fail the whole response
    daily: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoCurrent {
    temperature_2m: Option<f64>,
}

/// Parallel per-day arrays. Entries stay untyped so one bad value only
/// costs its own day.
#[derive(Debug, Default, Deserialize)]
struct OpenMeteoDaily {
    #[serde(default)]
    time: Vec<Value>,
    #[serde(default)]
    temperature_2m_max: Vec<Value>,
    #[serde(default)]
    temperature_2m_min: Vec<Value>,
    #[serde(default)]
    weather_code: Vec<Value>,
}

impl OpenMeteoDaily {
    fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::debug!("Ignoring malformed daily forecast: {}", e);
            Self::default()
        })
    }

    fn max_at(&self, i: usize) -> Option<f64> {
        self.temperature_2m_max.get(i).and_then(Value::as_f64)
    }

    fn min_at(&self, i: usize) -> Option<f64> {
        self.temperature_2m_min.get(i).and_then(Value::as_f64)
    }

    fn code_at(&self, i: usize) -> Option<i32> {
        self.weather_code
            .get(i)
            .and_then(Value::as_i64)
            .and_then(|code| i32::try_from(code).ok())
    }
}

/// HTTP weather client for an Open-Meteo-compatible server.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    base_url: String,
    unit: TemperatureUnit,
    forecast_days: u8,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            unit: config.temperature_unit,
            forecast_days: config.forecast_days,
        })
    }
}

#[async_trait]
impl WeatherFetcher for WeatherProvider {
    #[instrument(skip(self, location), fields(postal_code = %location.postal_code), level = "info")]
    async fn fetch(&self, location: &Location) -> Result<ForecastData, FetchError> {
        let unit = resolve_unit(self.unit, &location.country_code);
        let unit_param = match unit {
            TemperatureUnit::Fahrenheit => "fahrenheit",
            _ => "celsius",
        };

        let url = format!("{}/v1/forecast", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("current", "temperature_2m".to_string()),
                (
                    "daily",
                    "temperature_2m_max,temperature_2m_min,weather_code".to_string(),
                ),
                ("temperature_unit", unit_param.to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", self.forecast_days.to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Weather request failed: {}", e);
                FetchError::Network(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Weather provider returned status {}", status);
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: OpenMeteoResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        let forecast = to_forecast(body, unit)?;
        tracing::info!(
            "Fetched forecast: {} {:?}, {} extended days",
            forecast.current_temperature,
            forecast.unit,
            forecast.extended.len()
        );
        Ok(forecast)
    }
}

fn to_forecast(body: OpenMeteoResponse, unit: TemperatureUnit) -> Result<ForecastData, FetchError> {
    let current_temperature = body
        .current
        .and_then(|c| c.temperature_2m)
        .ok_or(FetchError::MissingCurrentTemperature)?;

    let daily = body.daily.map(OpenMeteoDaily::from_value).unwrap_or_default();

    Ok(ForecastData {
        current_temperature,
        high: daily.max_at(0),
        low: daily.min_at(0),
        extended: extended_days(&daily),
        unit,
        fetched_at: Utc::now(),
    })
}

/// Days with a valid date, a high and a low; anything partial is left out.
fn extended_days(daily: &OpenMeteoDaily) -> Vec<DayForecast> {
    let mut days = Vec::with_capacity(daily.time.len());

    for (i, day) in daily.time.iter().enumerate() {
        let (Some(high), Some(low)) = (daily.max_at(i), daily.min_at(i)) else {
            continue;
        };
        let Some(date) = day
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        else {
            tracing::debug!("Skipping forecast day with invalid date {}", day);
            continue;
        };

        let condition = daily
            .code_at(i)
            .map_or(WeatherCondition::Unknown, WeatherCondition::from_wmo_code);

        days.push(DayForecast {
            date,
            high,
            low,
            summary: condition.description().to_string(),
        });
    }

    days
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cupertino() -> Location {
        Location::new(37.3317, -122.0302, "us", "95014").unwrap()
    }

    fn provider_for(server: &MockServer, unit: TemperatureUnit) -> WeatherProvider {
        let config = WeatherConfig {
            base_url: server.uri(),
            temperature_unit: unit,
            forecast_days: 3,
            ..WeatherConfig::default()
        };
        WeatherProvider::new(&config).unwrap()
    }

    async fn mount_forecast(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_resolve_unit_auto() {
        assert_eq!(resolve_unit(TemperatureUnit::Auto, "us"), TemperatureUnit::Fahrenheit);
        assert_eq!(resolve_unit(TemperatureUnit::Auto, "US"), TemperatureUnit::Fahrenheit);
        assert_eq!(resolve_unit(TemperatureUnit::Auto, "fr"), TemperatureUnit::Celsius);
    }

    #[test]
    fn test_resolve_unit_explicit_wins() {
        assert_eq!(resolve_unit(TemperatureUnit::Celsius, "us"), TemperatureUnit::Celsius);
        assert_eq!(resolve_unit(TemperatureUnit::Fahrenheit, "de"), TemperatureUnit::Fahrenheit);
    }

    #[tokio::test]
    async fn test_fetch_full_forecast() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "37.3317"))
            .and(query_param("longitude", "-122.0302"))
            .and(query_param("temperature_unit", "fahrenheit"))
            .and(query_param("forecast_days", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": 37.33,
                "longitude": -122.03,
                "current": {"time": "2026-10-19T10:00", "temperature_2m": 61.3},
                "daily": {
                    "time": ["2026-10-19", "2026-10-20", "2026-10-21"],
                    "temperature_2m_max": [72.1, 70.4, 68.0],
                    "temperature_2m_min": [52.3, 51.0, 50.2],
                    "weather_code": [0, 3, 61]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let data = provider_for(&server, TemperatureUnit::Auto)
            .fetch(&cupertino())
            .await
            .unwrap();

        assert_eq!(data.current_temperature, 61.3);
        assert_eq!(data.high, Some(72.1));
        assert_eq!(data.low, Some(52.3));
        assert_eq!(data.unit, TemperatureUnit::Fahrenheit);
        assert_eq!(data.extended.len(), 3);
        assert_eq!(data.extended[0].summary, "Clear");
        assert_eq!(data.extended[1].summary, "Cloudy");
        assert_eq!(data.extended[2].summary, "Rain");
        assert_eq!(
            data.extended[2].date,
            NaiveDate::from_ymd_opt(2026, 10, 21).unwrap()
        );
    }

    #[tokio::test]
    async fn test_fetch_current_only() {
        let server = MockServer::start().await;
        mount_forecast(&server, serde_json::json!({"current": {"temperature_2m": 18.0}})).await;

        let data = provider_for(&server, TemperatureUnit::Celsius)
            .fetch(&cupertino())
            .await
            .unwrap();

        assert_eq!(data.current_temperature, 18.0);
        assert_eq!(data.high, None);
        assert_eq!(data.low, None);
        assert!(data.extended.is_empty());
        assert_eq!(data.unit, TemperatureUnit::Celsius);
    }

    #[tokio::test]
    async fn test_partial_days_are_omitted() {
        let server = MockServer::start().await;
        mount_forecast(
            &server,
            serde_json::json!({
                "current": {"temperature_2m": 61.3},
                "daily": {
                    "time": ["2026-10-19", "2026-10-20", "2026-10-21"],
                    "temperature_2m_max": [null, 70.4, 68.0],
                    "temperature_2m_min": [52.3, 51.0],
                    "weather_code": [0, null]
                }
            }),
        )
        .await;

        let data = provider_for(&server, TemperatureUnit::Auto)
            .fetch(&cupertino())
            .await
            .unwrap();

        assert_eq!(data.high, None);
        assert_eq!(data.low, Some(52.3));
        assert_eq!(data.extended.len(), 1);
        assert_eq!(data.extended[0].high, 70.4);
        assert_eq!(data.extended[0].summary, "Unknown");
    }

    #[tokio::test]
    async fn test_missing_current_temperature() {
        let server = MockServer::start().await;
        mount_forecast(
            &server,
            serde_json::json!({
                "current": {"time": "2026-10-19T10:00"},
                "daily": {"time": ["2026-10-19"], "temperature_2m_max": [72.1], "temperature_2m_min": [52.3]}
            }),
        )
        .await;

        let err = provider_for(&server, TemperatureUnit::Auto)
            .fetch(&cupertino())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingCurrentTemperature));
    }

    #[tokio::test]
    async fn test_missing_current_block() {
        let server = MockServer::start().await;
        mount_forecast(&server, serde_json::json!({"latitude": 37.33})).await;

        let err = provider_for(&server, TemperatureUnit::Auto)
            .fetch(&cupertino())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingCurrentTemperature));
    }

    #[tokio::test]
    async fn test_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": true,
                "reason": "Latitude must be in range of -90 to 90°."
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server, TemperatureUnit::Auto)
            .fetch(&cupertino())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 400, ref body } if body.contains("Latitude")));
    }

    #[tokio::test]
    async fn test_invalid_date_drops_only_that_day() {
        let server = MockServer::start().await;
        mount_forecast(
            &server,
            serde_json::json!({
                "current": {"temperature_2m": 61.3},
                "daily": {
                    "time": ["tomorrow", "2026-10-20"],
                    "temperature_2m_max": [72.1, 70.4],
                    "temperature_2m_min": [52.3, 51.0],
                    "weather_code": [0, 3]
                }
            }),
        )
        .await;

        let forecast = provider_for(&server, TemperatureUnit::Auto)
            .fetch(&cupertino())
            .await
            .unwrap();
        assert_eq!(forecast.current_temperature, 61.3);
        assert_eq!(forecast.extended.len(), 1);
        assert_eq!(
            forecast.extended[0].date,
            NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
        );
    }

    #[tokio::test]
    async fn test_malformed_daily_values_keep_current_temperature() {
        let server = MockServer::start().await;
        mount_forecast(
            &server,
            serde_json::json!({
                "current": {"temperature_2m": 61.3},
                "daily": {
                    "time": ["2026-10-19", "2026-10-20"],
                    "temperature_2m_max": ["n/a", 70.4],
                    "temperature_2m_min": [52.3, 51.0],
                    "weather_code": [0, "sunny"]
                }
            }),
        )
        .await;

        let forecast = provider_for(&server, TemperatureUnit::Auto)
            .fetch(&cupertino())
            .await
            .unwrap();
        assert_eq!(forecast.current_temperature, 61.3);
        assert_eq!(forecast.high, None);
        assert_eq!(forecast.low, Some(52.3));
        assert_eq!(forecast.extended.len(), 1);
        assert_eq!(forecast.extended[0].summary, "Unknown");
    }

    #[tokio::test]
    async fn test_daily_block_of_wrong_shape_is_ignored() {
        let server = MockServer::start().await;
        mount_forecast(
            &server,
            serde_json::json!({
                "current": {"temperature_2m": 61.3},
                "daily": {"time": "2026-10-19", "temperature_2m_max": 72.1}
            }),
        )
        .await;

        let forecast = provider_for(&server, TemperatureUnit::Auto)
            .fetch(&cupertino())
            .await
            .unwrap();
        assert_eq!(forecast.current_temperature, 61.3);
        assert_eq!(forecast.high, None);
        assert!(forecast.extended.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let config = WeatherConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..WeatherConfig::default()
        };
        let err = WeatherProvider::new(&config)
            .unwrap()
            .fetch(&cupertino())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
