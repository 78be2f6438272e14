//! Core library for the `weather` app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The WeatherAPI.com gateway (location search, multi-day forecast)
//! - Persistence of the last confirmed city
//! - The debounced search / forecast refresh workflow controller
//!
//! It is used by `weather-cli`, but any presentation layer can drive the
//! [`WorkflowController`] and render its [`WorkflowState`].

pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod gateway;
pub mod model;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, WorkflowSettings};
pub use controller::WorkflowController;
pub use debounce::{Scheduled, SearchDebouncer};
pub use error::{ConfigError, GatewayError, StoreError};
pub use gateway::{WeatherGateway, cached::CachedGateway, weatherapi::WeatherApiGateway};
pub use model::{
    CurrentConditions, DailyForecast, ForecastDays, ForecastSnapshot, LocationCandidate,
    LocationSummary, WorkflowState,
};
pub use store::{FileLocationStore, LastLocationStore, MemoryLocationStore};
