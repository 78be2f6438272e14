//! Freshness cache in front of a gateway.
//!
//! WeatherAPI refreshes its data every 15 minutes, so repeating a search or a
//! forecast inside that window only costs quota. Only successful, non-empty
//! results are cached.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{collections::HashMap, time::Duration};
use tokio::time::Instant;

use crate::model::{ForecastDays, ForecastSnapshot, LocationCandidate};

use super::WeatherGateway;

pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug)]
struct Entry<T> {
    stored_at: Instant,
    value: T,
}

#[derive(Debug)]
pub struct CachedGateway<G> {
    inner: G,
    ttl: Duration,
    searches: Mutex<HashMap<String, Entry<Vec<LocationCandidate>>>>,
    forecasts: Mutex<HashMap<(String, ForecastDays), Entry<ForecastSnapshot>>>,
}

impl<G: WeatherGateway> CachedGateway<G> {
    pub fn new(inner: G, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            searches: Mutex::new(HashMap::new()),
            forecasts: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    fn fresh<K, T>(&self, map: &Mutex<HashMap<K, Entry<T>>>, key: &K) -> Option<T>
    where
        K: std::hash::Hash + Eq,
        T: Clone,
    {
        let mut map = map.lock();
        let entry = map.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            return Some(entry.value.clone());
        }
        map.remove(key);
        None
    }

    /// Insert `value`, dropping every entry that has outlived the TTL.
    fn remember<K, T>(&self, map: &Mutex<HashMap<K, Entry<T>>>, key: K, value: T)
    where
        K: std::hash::Hash + Eq,
    {
        let mut map = map.lock();
        map.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        map.insert(
            key,
            Entry {
                stored_at: Instant::now(),
                value,
            },
        );
    }
}

fn cache_key(s: &str) -> String {
    s.trim().to_lowercase()
}

#[async_trait]
impl<G: WeatherGateway> WeatherGateway for CachedGateway<G> {
    async fn search_locations(&self, query: &str) -> Vec<LocationCandidate> {
        let key = cache_key(query);
        if let Some(hit) = self.fresh(&self.searches, &key) {
            tracing::debug!(query, "location search served from cache");
            return hit;
        }

        let candidates = self.inner.search_locations(query).await;
        if !candidates.is_empty() {
            self.remember(&self.searches, key, candidates.clone());
        }
        candidates
    }

    async fn fetch_forecast(&self, city: &str, days: ForecastDays) -> Option<ForecastSnapshot> {
        let key = (cache_key(city), days);
        if let Some(hit) = self.fresh(&self.forecasts, &key) {
            tracing::debug!(city, "forecast served from cache");
            return Some(hit);
        }

        let snapshot = self.inner.fetch_forecast(city, days).await?;
        self.remember(&self.forecasts, key, snapshot.clone());
        Some(snapshot)
    }
}
