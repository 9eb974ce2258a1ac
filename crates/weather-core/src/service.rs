use crate::error::WeatherError;
use crate::provider::WeatherProvider;
use crate::reading::WeatherReading;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use weather_cache::{CacheStats, CacheStore};

pub const CACHE_KEY_PREFIX: &str = "weather:";

/// Cache key for an already-trimmed city. Case-sensitive, no escaping.
pub fn cache_key(city: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{city}")
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub logging_enabled: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl: Duration::from_secs(600),
            logging_enabled: true,
        }
    }
}

/// Static description of how the pipeline is wired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub provider_order: Vec<String>,
    pub total_providers: usize,
    pub fallback_enabled: bool,
    pub cache_enabled: bool,
    pub logging_enabled: bool,
}

/// Cache-aside front of the provider chain.
///
/// Every `get_weather` call is an independent run: validate, look up the
/// cache, resolve on a miss, validate the reading, write it back. Concurrent
/// misses for one city are not coalesced; each resolves and writes, and the
/// last write wins.
pub struct WeatherService {
    upstream: Arc<dyn WeatherProvider>,
    cache: Arc<dyn CacheStore>,
    provider_order: Vec<String>,
    settings: ServiceSettings,
}

impl WeatherService {
    /// `upstream` is usually the (possibly observed) fallback resolver;
    /// `provider_order` is reported back through [`Self::provider_info`].
    pub fn new(
        upstream: Arc<dyn WeatherProvider>,
        cache: Arc<dyn CacheStore>,
        provider_order: Vec<String>,
        settings: ServiceSettings,
    ) -> Self {
        tracing::info!(
            upstream = upstream.name(),
            cache = cache.name(),
            cache_enabled = settings.cache_enabled,
            ttl_secs = settings.cache_ttl.as_secs(),
            "weather service initialized"
        );
        Self {
            upstream,
            cache,
            provider_order,
            settings,
        }
    }

    pub async fn get_weather(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::Validation("city must not be empty".into()));
        }

        let key = cache_key(city);

        if self.settings.cache_enabled {
            if let Some(reading) = self.read_cached(&key).await {
                tracing::debug!(city, "cache HIT");
                return Ok(reading);
            }
            tracing::debug!(city, "cache MISS");
        }

        let reading = self.upstream.fetch(city).await.map_err(|e| {
            if e.is_not_found() {
                e.into_last_failure()
            } else {
                WeatherError::ExternalApi {
                    service: self.upstream.name().to_string(),
                    message: format!("failed to fetch weather for {city}: {e}"),
                    cause: Some(Box::new(e)),
                }
            }
        })?;

        if let Err(e) = reading.validate() {
            tracing::warn!(city, error = %e, "provider returned an invalid reading");
            return Err(match e {
                WeatherError::Validation(msg) => {
                    WeatherError::Validation(format!("invalid reading for {city}: {msg}"))
                }
                other => other,
            });
        }

        if self.settings.cache_enabled {
            self.write_cached(&key, &reading).await;
        }

        Ok(reading)
    }

    /// A read error or an undecodable payload counts as a miss.
    async fn read_cached(&self, key: &str) -> Option<WeatherReading> {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<WeatherReading>(&bytes) {
                Ok(reading) => Some(reading),
                Err(e) => {
                    tracing::warn!(key, error = %e, "cached reading is unreadable, ignoring");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, backend = self.cache.name(), error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Best effort: failures are logged, never returned.
    async fn write_cached(&self, key: &str, reading: &WeatherReading) {
        let payload = match serde_json::to_vec(reading) {
            Ok(p) => Bytes::from(p),
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to serialize reading for cache");
                return;
            }
        };

        if let Err(e) = self.cache.set(key, payload, self.settings.cache_ttl).await {
            tracing::warn!(key, backend = self.cache.name(), error = %e, "cache write failed");
        }
    }

    pub fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            provider_order: self.provider_order.clone(),
            total_providers: self.provider_order.len(),
            fallback_enabled: self.provider_order.len() > 1,
            cache_enabled: self.settings.cache_enabled,
            logging_enabled: self.settings.logging_enabled,
        }
    }

    pub fn cache_metrics(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.name()
    }
}
