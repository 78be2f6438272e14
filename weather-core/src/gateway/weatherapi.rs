use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    error::GatewayError,
    model::{
        CurrentConditions, DailyForecast, ForecastDays, ForecastSnapshot, LocationCandidate,
        LocationSummary,
    },
};

use super::WeatherGateway;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// WeatherAPI.com client for `search.json` and `forecast.json`.
#[derive(Clone)]
pub struct WeatherApiGateway {
    api_key: String,
    base_url: String,
    http: Client,
}

impl std::fmt::Debug for WeatherApiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiGateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl WeatherApiGateway {
    pub fn new(api_key: String) -> Result<Self, reqwest::Error> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Point the gateway at another host, e.g. a mock server in tests.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub async fn try_search_locations(
        &self,
        query: &str,
    ) -> Result<Vec<LocationCandidate>, GatewayError> {
        let rows: Vec<WaSearchRow> = self
            .get_json("search", &[("key", self.api_key.as_str()), ("q", query)])
            .await?;

        Ok(rows.into_iter().map(LocationCandidate::from).collect())
    }

    pub async fn try_fetch_forecast(
        &self,
        city: &str,
        days: ForecastDays,
    ) -> Result<ForecastSnapshot, GatewayError> {
        let days = days.to_string();
        let parsed: WaForecastResponse = self
            .get_json(
                "forecast",
                &[
                    ("key", self.api_key.as_str()),
                    ("q", city),
                    ("days", days.as_str()),
                    ("aqi", "no"),
                    ("alerts", "no"),
                ],
            )
            .await?;

        Ok(parsed.into())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let url = format!("{}/{}.json", self.base_url, endpoint);
        tracing::debug!(%url, "requesting weather provider {endpoint}");

        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| GatewayError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| GatewayError::Transport { endpoint, source })?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| GatewayError::Decode { endpoint, source })
    }
}

#[async_trait]
impl WeatherGateway for WeatherApiGateway {
    async fn search_locations(&self, query: &str) -> Vec<LocationCandidate> {
        match self.try_search_locations(query).await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(query, error = %err, "location search failed");
                Vec::new()
            }
        }
    }

    async fn fetch_forecast(&self, city: &str, days: ForecastDays) -> Option<ForecastSnapshot> {
        match self.try_fetch_forecast(city, days).await {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(city, error = %err, "forecast fetch failed");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct WaSearchRow {
    id: u64,
    name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
    lat: f64,
    lon: f64,
}

impl From<WaSearchRow> for LocationCandidate {
    fn from(row: WaSearchRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            region: row.region,
            country: row.country,
            latitude: row.lat,
            longitude: row.lon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    condition: WaCondition,
    wind_kph: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    avgtemp_c: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaAstro {
    sunrise: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
    astro: Option<WaAstro>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    current: WaCurrent,
    forecast: WaForecast,
}

impl From<WaForecastResponse> for ForecastSnapshot {
    fn from(parsed: WaForecastResponse) -> Self {
        let sunrise = parsed
            .forecast
            .forecastday
            .first()
            .and_then(|d| d.astro.as_ref())
            .and_then(|a| a.sunrise.clone());

        let daily_forecast = parsed
            .forecast
            .forecastday
            .into_iter()
            .map(|d| DailyForecast {
                date: d.date,
                avg_temperature_c: d.day.avgtemp_c,
                condition_text: d.day.condition.text,
            })
            .collect();

        ForecastSnapshot {
            location: LocationSummary {
                name: parsed.location.name,
                country: parsed.location.country,
            },
            current: CurrentConditions {
                temperature_c: parsed.current.temp_c,
                condition_text: parsed.current.condition.text,
                wind_kph: parsed.current.wind_kph,
                humidity_pct: parsed.current.humidity,
                sunrise,
            },
            daily_forecast,
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
