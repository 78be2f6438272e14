use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One row of a location search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub id: u64,
    pub name: String,
    pub region: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationCandidate {
    /// "Name, Country" as shown in a picker.
    pub fn label(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

impl std::fmt::Display for LocationCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.region.is_empty() || self.region == self.name {
            f.write_str(&self.label())
        } else {
            write!(f, "{}, {}, {}", self.name, self.region, self.country)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSummary {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub condition_text: String,
    pub wind_kph: f64,
    pub humidity_pct: u8,
    /// Local sunrise of the first forecast day, e.g. "06:05 AM".
    pub sunrise: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub avg_temperature_c: f64,
    pub condition_text: String,
}

/// A complete forecast result. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub location: LocationSummary,
    pub current: CurrentConditions,
    pub daily_forecast: Vec<DailyForecast>,
}

/// Number of forecast days the provider is asked for, always within 1..=14.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ForecastDays(u8);

impl ForecastDays {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 14;
    pub const WEEK: ForecastDays = ForecastDays(7);

    pub fn new(days: u8) -> Result<Self, ConfigError> {
        if (Self::MIN..=Self::MAX).contains(&days) {
            Ok(Self(days))
        } else {
            Err(ConfigError::ForecastDaysOutOfRange(days))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for ForecastDays {
    fn default() -> Self {
        Self::WEEK
    }
}

impl TryFrom<u8> for ForecastDays {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ForecastDays> for u8 {
    fn from(days: ForecastDays) -> Self {
        days.0
    }
}

impl std::fmt::Display for ForecastDays {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The view-model handed to the presentation layer.
///
/// `candidates` is only non-empty while `search_open` is set, and `loading`
/// is only set while a forecast fetch is outstanding. `searching` is set from
/// the moment a query is accepted until its results (possibly none) land.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowState {
    pub loading: bool,
    pub search_open: bool,
    pub searching: bool,
    pub candidates: Vec<LocationCandidate>,
    pub snapshot: Option<ForecastSnapshot>,
}
