use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc, time::Duration};

use crate::{
    Config,
    gateway::{cached::CachedGateway, weatherapi::WeatherApiGateway},
    model::{ForecastDays, ForecastSnapshot, LocationCandidate},
};

pub mod cached;
pub mod weatherapi;

/// Read-only access to the weather provider.
///
/// Implementations never surface errors: a failed search yields no
/// candidates and a failed forecast yields `None`. Each call is a single
/// attempt.
#[async_trait]
pub trait WeatherGateway: Send + Sync + Debug {
    async fn search_locations(&self, query: &str) -> Vec<LocationCandidate>;

    async fn fetch_forecast(&self, city: &str, days: ForecastDays) -> Option<ForecastSnapshot>;
}

/// Build the gateway described by `config`, wrapped in the freshness cache
/// unless `cache_ttl_secs` is zero.
pub fn gateway_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherGateway>> {
    let api_key = config.api_key()?;
    let inner = WeatherApiGateway::with_base_url(api_key.to_owned(), config.base_url.clone())?;

    let gateway: Arc<dyn WeatherGateway> = if config.cache_ttl_secs == 0 {
        Arc::new(inner)
    } else {
        Arc::new(CachedGateway::new(
            inner,
            Duration::from_secs(config.cache_ttl_secs),
        ))
    };

    Ok(gateway)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = gateway_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn gateway_from_config_works_when_key_present() {
        let cfg = Config {
            api_key: Some("KEY".into()),
            ..Config::default()
        };
        assert!(gateway_from_config(&cfg).is_ok());

        let uncached = Config {
            api_key: Some("KEY".into()),
            cache_ttl_secs: 0,
            ..Config::default()
        };
        let gateway = gateway_from_config(&uncached).expect("gateway");
        assert!(format!("{gateway:?}").contains("WeatherApiGateway"));
    }
}
