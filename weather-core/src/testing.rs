//! In-process doubles for the gateway, shared by the unit tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::{collections::HashMap, time::Duration};

use crate::{
    gateway::WeatherGateway,
    model::{
        CurrentConditions, DailyForecast, ForecastDays, ForecastSnapshot, LocationCandidate,
        LocationSummary,
    },
};

pub fn candidate(id: u64, name: &str) -> LocationCandidate {
    LocationCandidate {
        id,
        name: name.to_string(),
        region: String::new(),
        country: "Testland".to_string(),
        latitude: 0.0,
        longitude: 0.0,
    }
}

pub fn snapshot_for(city: &str) -> ForecastSnapshot {
    ForecastSnapshot {
        location: LocationSummary {
            name: city.to_string(),
            country: "Testland".to_string(),
        },
        current: CurrentConditions {
            temperature_c: 21.0,
            condition_text: "Partly cloudy".to_string(),
            wind_kph: 12.0,
            humidity_pct: 55,
            sunrise: Some("06:05 AM".to_string()),
        },
        daily_forecast: vec![DailyForecast {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default(),
            avg_temperature_c: 19.5,
            condition_text: "Sunny".to_string(),
        }],
    }
}

/// Scripted gateway: answers from preset tables, records every call and can
/// delay individual responses (keyed by query or city).
#[derive(Debug, Default)]
pub struct FakeGateway {
    searches: Mutex<HashMap<String, Vec<LocationCandidate>>>,
    forecasts: Mutex<HashMap<String, Option<ForecastSnapshot>>>,
    delays: Mutex<HashMap<String, Duration>>,
    search_calls: Mutex<Vec<String>>,
    forecast_calls: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn set_search(&self, query: &str, results: Vec<LocationCandidate>) {
        self.searches.lock().insert(query.to_string(), results);
    }

    pub fn set_forecast(&self, city: &str, snapshot: Option<ForecastSnapshot>) {
        self.forecasts.lock().insert(city.to_string(), snapshot);
    }

    pub fn set_delay(&self, city: &str, delay: Duration) {
        self.delays.lock().insert(city.to_string(), delay);
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().clone()
    }

    pub fn forecast_calls(&self) -> Vec<String> {
        self.forecast_calls.lock().clone()
    }
}

#[async_trait]
impl WeatherGateway for FakeGateway {
    async fn search_locations(&self, query: &str) -> Vec<LocationCandidate> {
        self.search_calls.lock().push(query.to_string());
        let delay = self.delays.lock().get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.searches.lock().get(query).cloned().unwrap_or_default()
    }

    async fn fetch_forecast(&self, city: &str, _days: ForecastDays) -> Option<ForecastSnapshot> {
        self.forecast_calls.lock().push(city.to_string());
        let delay = self.delays.lock().get(city).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.forecasts.lock().get(city).cloned().flatten()
    }
}
